use egui::{Pos2, Rect};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::picking::Ray;
use crate::graph_utils::layout::ViewMode;

// Radians of orbit per dragged pixel
const ORBIT_SPEED: f32 = 0.005;
// Keep just short of the poles so look_at never degenerates
const MAX_PITCH: f32 = 1.45;
// Fraction of the current distance per scrolled point
const WHEEL_SENSITIVITY: f32 = 0.001;
const FIT_MARGIN: f32 = 1.15;
const NEAR: f32 = 0.01;
const FAR: f32 = 10_000.0;

/// Persistable part of the camera.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub target: (f32, f32, f32),
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Projected {
    pub pos: Pos2,
    // view-space distance; larger is further away
    pub depth: f32,
}

#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub fov_y: f32,
    home: CameraState,
}

impl OrbitCamera {
    pub fn new(distance: f32, min_distance: f32, max_distance: f32) -> Self {
        // clamp requires min <= max
        let (min_distance, max_distance) = (min_distance.min(max_distance), min_distance.max(max_distance));
        let distance = distance.clamp(min_distance, max_distance);
        let home = CameraState { target: (0.0, 0.0, 0.0), yaw: 0.0, pitch: 0.35, distance };
        let mut cam = Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            distance,
            min_distance,
            max_distance,
            fov_y: 60f32.to_radians(),
            home,
        };
        cam.restore(&home);
        cam
    }

    pub fn for_mode(mode: ViewMode, min_distance: f32, max_distance: f32) -> Self {
        // The range is configured in desktop units; AR scales it down with the layout
        let k = mode.base_radius() / ViewMode::Desktop.base_radius();
        Self::new(mode.base_radius() * 3.0, min_distance * k, max_distance * k)
    }

    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), NEAR, FAR)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    pub fn orbit(&mut self, delta: egui::Vec2) {
        self.yaw -= delta.x * ORBIT_SPEED;
        self.pitch = (self.pitch + delta.y * ORBIT_SPEED).clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn set_distance(&mut self, d: f32) {
        self.distance = d.clamp(self.min_distance, self.max_distance);
    }

    /// Positive deltas (wheel up) move the camera closer.
    pub fn scroll(&mut self, delta: f32) {
        self.set_distance(self.distance * (1.0 - delta * WHEEL_SENSITIVITY));
    }

    /// factor < 1 zooms in.
    pub fn zoom_by(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.set_distance(self.distance * factor);
        }
    }

    /// Frame a bounding sphere.
    pub fn fit(&mut self, center: Vec3, radius: f32) {
        self.target = center;
        let half = (self.fov_y * 0.5).sin().max(1e-3);
        self.set_distance(radius.max(1e-3) / half * FIT_MARGIN);
    }

    /// Make the current view the one `reset` returns to.
    pub fn set_home(&mut self) {
        self.home = self.state();
    }

    pub fn reset(&mut self) {
        let home = self.home;
        self.restore(&home);
    }

    pub fn state(&self) -> CameraState {
        CameraState { target: self.target.into(), yaw: self.yaw, pitch: self.pitch, distance: self.distance }
    }

    pub fn restore(&mut self, s: &CameraState) {
        self.target = Vec3::from(s.target);
        self.yaw = s.yaw;
        self.pitch = s.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.set_distance(s.distance);
    }

    pub fn screen_to_ndc(pos: Pos2, viewport: Rect) -> Vec2 {
        let x = (pos.x - viewport.left()) / viewport.width().max(1.0) * 2.0 - 1.0;
        let y = (pos.y - viewport.top()) / viewport.height().max(1.0) * 2.0 - 1.0;
        Vec2::new(x, -y)
    }

    /// Ray from normalized device coordinates through the camera.
    pub fn ray_from_ndc(&self, ndc: Vec2, aspect: f32) -> Ray {
        let inv = self.view_projection(aspect).inverse();
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(near, far - near)
    }

    pub fn ray_from_screen(&self, pos: Pos2, viewport: Rect) -> Ray {
        let aspect = viewport.width() / viewport.height().max(1.0);
        self.ray_from_ndc(Self::screen_to_ndc(pos, viewport), aspect)
    }

    pub fn project(&self, world: Vec3, viewport: Rect) -> Option<Projected> {
        let aspect = viewport.width() / viewport.height().max(1.0);
        let clip = self.view_projection(aspect) * world.extend(1.0);
        if clip.w <= NEAR {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = viewport.left() + (ndc.x + 1.0) * 0.5 * viewport.width();
        let y = viewport.top() + (1.0 - ndc.y) * 0.5 * viewport.height();
        Some(Projected { pos: Pos2::new(x, y), depth: clip.w })
    }

    /// Screen pixels covered by one world unit at the given view depth.
    pub fn pixels_per_unit(&self, depth: f32, viewport: Rect) -> f32 {
        viewport.height() / (2.0 * (self.fov_y * 0.5).tan() * depth.max(NEAR))
    }
}
