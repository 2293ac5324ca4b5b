use std::rc::Rc;

use glam::Vec3;
use tracing::{debug, info};

use super::input::{Direction, KeyState};
use crate::audio::SoundCue;
use crate::config::ViewerConfig;
use crate::model::Camera;

/// Moves the camera one step per button press and plays the move cue
pub struct CameraController {
    camera: Camera,
    keys: KeyState,
    home: Vec3,
    home_target: Vec3,
    movement_step: f32,
    vertical_step: f32,
    cue: Rc<dyn SoundCue>,
}

impl CameraController {
    /// Builds the controller with the camera already at its home pose.
    pub fn new(config: &ViewerConfig, cue: Rc<dyn SoundCue>) -> Self {
        let (width, height) = config.window_size;
        let mut controller = Self {
            camera: Camera::new(width, height),
            keys: KeyState::new(),
            home: config.camera_home,
            home_target: config.camera_target,
            movement_step: config.movement_step,
            vertical_step: config.vertical_step,
            cue,
        };
        controller.home_camera();
        controller
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn keys(&self) -> &KeyState {
        &self.keys
    }

    pub fn position(&self) -> Vec3 {
        self.camera.eye
    }

    pub fn set_key(&mut self, direction: Direction, pressed: bool) {
        self.keys.set(direction, pressed);
        debug!("set key {} to {}", direction.name(), pressed);
        if pressed {
            self.play_move_sound();
        }
    }

    /// Apply every pending direction once, in `Direction::ALL` order, and
    /// clear it. Returns how many steps were applied.
    pub fn tick(&mut self) -> usize {
        let mut applied = 0;
        for direction in Direction::ALL {
            if !self.keys.consume(direction) {
                continue;
            }
            self.camera.eye += self.delta(direction);
            applied += 1;
            debug!(
                "camera moved {} to position {}",
                direction.name(),
                self.camera.eye
            );
        }
        applied
    }

    /// Back to the home pose, with sound. Pending keys are left alone.
    pub fn reset(&mut self) {
        self.home_camera();
        self.play_move_sound();
    }

    fn home_camera(&mut self) {
        self.camera.eye = self.home;
        self.camera.set_look_at(self.home_target);
        info!(
            "camera reset to position {} looking at {}",
            self.home, self.home_target
        );
    }

    fn delta(&self, direction: Direction) -> Vec3 {
        match direction {
            Direction::Up => Vec3::Y * self.movement_step,
            Direction::Down => -Vec3::Y * self.movement_step,
            Direction::Left => -Vec3::X * self.movement_step,
            Direction::Right => Vec3::X * self.movement_step,
            Direction::VUp => Vec3::Z * self.vertical_step,
            Direction::VDown => -Vec3::Z * self.vertical_step,
        }
    }

    fn play_move_sound(&self) {
        debug!("move cue triggered");
        self.cue.play();
    }
}
