/// Button-driven input: direction flags and the movement panel's bindings
use tracing::debug;

use super::camera_controller::CameraController;

/// The six camera nudges offered by the movement panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    VUp,
    VDown,
}

impl Direction {
    /// Fixed order in which pending directions are applied during a tick
    pub const ALL: [Direction; 6] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::VUp,
        Direction::VDown,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
            Direction::VUp => 4,
            Direction::VDown => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::VUp => "vup",
            Direction::VDown => "vdown",
        }
    }
}

/// Per-direction flag. Pending means "pressed since the last tick consumed it".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPhase {
    #[default]
    Idle,
    Pending,
}

/// Edge-triggered key map: one step per press, consumed by the next tick
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    phases: [KeyPhase; 6],
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, direction: Direction, pressed: bool) {
        self.phases[direction.index()] = if pressed {
            KeyPhase::Pending
        } else {
            KeyPhase::Idle
        };
    }

    pub fn phase(&self, direction: Direction) -> KeyPhase {
        self.phases[direction.index()]
    }

    pub fn is_pending(&self, direction: Direction) -> bool {
        self.phase(direction) == KeyPhase::Pending
    }

    /// Pending -> Idle. Returns whether the direction was pending.
    pub fn consume(&mut self, direction: Direction) -> bool {
        let slot = &mut self.phases[direction.index()];
        let was_pending = *slot == KeyPhase::Pending;
        *slot = KeyPhase::Idle;
        was_pending
    }

    pub fn any_pending(&self) -> bool {
        self.phases.iter().any(|p| *p == KeyPhase::Pending)
    }
}

/// What a movement panel control does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Move(Direction),
    Reset,
}

impl PanelAction {
    /// Icon file stem under `icons/`
    pub fn icon_name(self) -> &'static str {
        match self {
            PanelAction::Move(direction) => direction.name(),
            PanelAction::Reset => "center",
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            PanelAction::Move(Direction::Up) => "Move forward",
            PanelAction::Move(Direction::Down) => "Move back",
            PanelAction::Move(Direction::Left) => "Move left",
            PanelAction::Move(Direction::Right) => "Move right",
            PanelAction::Move(Direction::VUp) => "Raise camera",
            PanelAction::Move(Direction::VDown) => "Lower camera",
            PanelAction::Reset => "Reset camera",
        }
    }
}

/// Grid placement of the movement panel, row by row. `None` is an empty cell.
pub const PANEL_LAYOUT: [[Option<PanelAction>; 3]; 3] = [
    [
        Some(PanelAction::Move(Direction::VUp)),
        Some(PanelAction::Move(Direction::Up)),
        Some(PanelAction::Move(Direction::VDown)),
    ],
    [
        Some(PanelAction::Move(Direction::Left)),
        Some(PanelAction::Reset),
        Some(PanelAction::Move(Direction::Right)),
    ],
    [None, Some(PanelAction::Move(Direction::Down)), None],
];

/// Every control in the panel, in layout order
pub fn panel_actions() -> impl Iterator<Item = PanelAction> {
    PANEL_LAYOUT.into_iter().flatten().flatten()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    Pressed,
    Released,
}

/// Turns a per-frame "is the pointer holding this button" level into edges
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonLatch {
    held: bool,
}

impl ButtonLatch {
    /// `clicked` covers a press and release that both landed inside one
    /// frame, where the held level never shows up. That tap counts as a
    /// press only, so its step stays pending for the next tick.
    pub fn update(&mut self, held: bool, clicked: bool) -> Option<ButtonEdge> {
        let edge = match (self.held, held) {
            (false, true) => Some(ButtonEdge::Pressed),
            (true, false) => Some(ButtonEdge::Released),
            (false, false) if clicked => Some(ButtonEdge::Pressed),
            _ => None,
        };
        self.held = held;
        edge
    }
}

/// Route a control edge to the camera. Reset only reacts to presses.
pub fn apply_edge(action: PanelAction, edge: ButtonEdge, camera: &mut CameraController) {
    debug!("panel {:?} {:?}", action, edge);
    match (action, edge) {
        (PanelAction::Move(direction), ButtonEdge::Pressed) => camera.set_key(direction, true),
        (PanelAction::Move(direction), ButtonEdge::Released) => camera.set_key(direction, false),
        (PanelAction::Reset, ButtonEdge::Pressed) => camera.reset(),
        (PanelAction::Reset, ButtonEdge::Released) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_phase_cycles_idle_pending_idle() {
        let mut keys = KeyState::new();
        assert_eq!(keys.phase(Direction::Left), KeyPhase::Idle);
        keys.set(Direction::Left, true);
        assert_eq!(keys.phase(Direction::Left), KeyPhase::Pending);
        assert!(keys.consume(Direction::Left));
        assert_eq!(keys.phase(Direction::Left), KeyPhase::Idle);
        assert!(!keys.consume(Direction::Left));
    }

    #[test]
    fn release_clears_pending() {
        let mut keys = KeyState::new();
        keys.set(Direction::VUp, true);
        keys.set(Direction::VUp, false);
        assert!(!keys.any_pending());
    }

    #[test]
    fn latch_reports_each_edge_once() {
        let mut latch = ButtonLatch::default();
        assert_eq!(latch.update(false, false), None);
        assert_eq!(latch.update(true, false), Some(ButtonEdge::Pressed));
        assert_eq!(latch.update(true, false), None);
        // The release frame also reports the click; it must not press again.
        assert_eq!(latch.update(false, true), Some(ButtonEdge::Released));
        assert_eq!(latch.update(false, false), None);
    }

    #[test]
    fn tap_within_one_frame_is_a_press() {
        let mut latch = ButtonLatch::default();
        assert_eq!(latch.update(false, true), Some(ButtonEdge::Pressed));
        assert_eq!(latch.update(false, false), None);
        assert_eq!(latch.update(false, true), Some(ButtonEdge::Pressed));
    }

    #[test]
    fn panel_has_seven_controls_with_reset_in_the_middle() {
        let actions: Vec<_> = panel_actions().collect();
        assert_eq!(actions.len(), 7);
        assert_eq!(PANEL_LAYOUT[1][1], Some(PanelAction::Reset));
        for direction in Direction::ALL {
            assert!(actions.contains(&PanelAction::Move(direction)));
        }
    }
}
