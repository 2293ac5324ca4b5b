use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use tracing::trace;

use super::camera_controller::CameraController;

/// Anything that drains the widget layer's pending events once per frame
pub trait UiPump {
    fn pump(&mut self);
}

impl<F: FnMut()> UiPump for F {
    fn pump(&mut self) {
        self()
    }
}

/// What happened during one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub camera_steps: usize,
    pub dt: f32,
}

/// Per-frame scheduler: camera tick first, then exactly one UI pump.
/// Driven by the window's redraw cadence; it owns no timer of its own.
pub struct FrameLoop {
    camera: Rc<RefCell<CameraController>>,
    frame: u64,
    last_frame: Option<Instant>,
    fps: f32,
    fps_frames: u32,
    fps_timer: f32,
}

impl FrameLoop {
    pub fn new(camera: Rc<RefCell<CameraController>>) -> Self {
        Self {
            camera,
            frame: 0,
            last_frame: None,
            fps: 0.0,
            fps_frames: 0,
            fps_timer: 0.0,
        }
    }

    pub fn run_frame<P: UiPump + ?Sized>(&mut self, ui: &mut P) -> FrameReport {
        self.run_frame_at(Instant::now(), ui)
    }

    pub fn run_frame_at<P: UiPump + ?Sized>(&mut self, now: Instant, ui: &mut P) -> FrameReport {
        let dt = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.update_fps(dt);

        // Borrow ends before the pump so UI callbacks can reach the camera.
        let camera_steps = self.camera.borrow_mut().tick();
        ui.pump();

        self.frame += 1;
        trace!(frame = self.frame, camera_steps, dt, "frame done");
        FrameReport {
            frame: self.frame,
            camera_steps,
            dt,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frame
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    fn update_fps(&mut self, dt: f32) {
        self.fps_frames += 1;
        self.fps_timer += dt;
        if self.fps_timer >= 1.0 {
            self.fps = self.fps_frames as f32 / self.fps_timer;
            self.fps_frames = 0;
            self.fps_timer = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CountingCue;
    use crate::config::ViewerConfig;
    use crate::controller::Direction;
    use std::time::Duration;

    fn camera() -> Rc<RefCell<CameraController>> {
        Rc::new(RefCell::new(CameraController::new(
            &ViewerConfig::default(),
            Rc::new(CountingCue::default()),
        )))
    }

    #[test]
    fn camera_ticks_before_ui_pump() {
        let camera = camera();
        camera.borrow_mut().set_key(Direction::Up, true);
        let mut frame_loop = FrameLoop::new(camera.clone());

        let observed = RefCell::new(Vec::new());
        let mut pump = || {
            // The step must already be applied when the UI runs.
            observed.borrow_mut().push(camera.borrow().position().y);
        };
        let report = frame_loop.run_frame(&mut pump);

        assert_eq!(report.camera_steps, 1);
        assert_eq!(report.frame, 1);
        assert_eq!(*observed.borrow(), vec![-9.0]);
    }

    #[test]
    fn press_during_pump_moves_on_next_frame() {
        let camera = camera();
        let mut frame_loop = FrameLoop::new(camera.clone());

        let mut pressed = false;
        let mut pump = || {
            if !pressed {
                camera.borrow_mut().set_key(Direction::VUp, true);
                pressed = true;
            }
        };
        assert_eq!(frame_loop.run_frame(&mut pump).camera_steps, 0);
        assert_eq!(frame_loop.run_frame(&mut pump).camera_steps, 1);
        assert_eq!(frame_loop.run_frame(&mut pump).camera_steps, 0);
        assert_eq!(camera.borrow().position().z, 1.0);
        assert_eq!(frame_loop.frames(), 3);
    }

    #[test]
    fn pump_runs_once_per_frame() {
        let mut frame_loop = FrameLoop::new(camera());
        let mut pumps = 0;
        let mut pump = || pumps += 1;
        for _ in 0..5 {
            frame_loop.run_frame(&mut pump);
        }
        assert_eq!(pumps, 5);
    }

    #[test]
    fn dt_and_fps_follow_supplied_clock() {
        let mut frame_loop = FrameLoop::new(camera());
        let start = Instant::now();
        let mut pump = || {};
        assert_eq!(frame_loop.run_frame_at(start, &mut pump).dt, 0.0);
        for i in 1..=15 {
            let report = frame_loop.run_frame_at(start + Duration::from_millis(100 * i), &mut pump);
            assert!((report.dt - 0.1).abs() < 1e-3);
        }
        let fps = frame_loop.fps();
        assert!(fps > 9.0 && fps < 12.5, "fps {fps}");
    }
}
