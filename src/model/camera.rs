use glam::{Mat4, Vec3};

/// Scene camera. The world is Z-up: Y is depth into the scene, X is lateral.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            eye: Vec3::ZERO,
            forward: Vec3::Y,
            up: Vec3::Z,
            fov_y: 40f32.to_radians(),
            aspect: 1.0,
            z_near: 0.1,
            z_far: 1000.0,
        };
        camera.set_aspect(width, height);
        camera
    }

    pub fn target(&self) -> Vec3 {
        self.eye + self.forward
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Point the camera at `target`. A target at the eye itself leaves the heading unchanged.
    pub fn set_look_at(&mut self, target: Vec3) {
        let dir = (target - self.eye).normalize_or_zero();
        if dir != Vec3::ZERO {
            self.forward = dir;
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target(), self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }
}
