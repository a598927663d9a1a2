pub mod camera;
pub mod picking;

use glam::{Mat4, Quat, Vec3};

// Pinch-to-scale limits for the placed graph
pub const MIN_SCENE_SCALE: f32 = 0.1;
pub const MAX_SCENE_SCALE: f32 = 10.0;
// Radians of rotation per dragged pixel in long-press rotate mode
pub const ROTATE_SPEED: f32 = 0.01;

/// Whole-graph scale and rotation about the vertical axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SceneTransform {
    pub scale: f32,
    pub rotation_y: f32,
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self { scale: 1.0, rotation_y: 0.0 }
    }
}

impl SceneTransform {
    pub fn model(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), Quat::from_rotation_y(self.rotation_y), Vec3::ZERO)
    }

    pub fn apply(&self, p: Vec3) -> Vec3 {
        self.model().transform_point3(p)
    }

    pub fn scale_by(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.scale = (self.scale * factor).clamp(MIN_SCENE_SCALE, MAX_SCENE_SCALE);
        }
    }

    pub fn rotate(&mut self, pixels: f32) {
        self.rotation_y = (self.rotation_y + pixels * ROTATE_SPEED).rem_euclid(std::f32::consts::TAU);
    }
}
