use egui::Rect;

use super::gesture::GestureEvent;
use super::selection::SelectionState;
use crate::graph_utils::graph::SceneGraph;
use crate::graph_utils::layout::ViewMode;
use crate::scene::camera::OrbitCamera;
use crate::scene::picking::{self, Ray};
use crate::scene::SceneTransform;

/// What a routed gesture did. `Missed` means a hit test found nothing and
/// the selection was left alone.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RouteOutcome {
    Selected(usize),
    Missed,
    Orbited,
    Zoomed,
    Scaled,
    RotateArmed,
    Rotated,
}

/// Mutable view of the session the router acts on.
pub struct RouteTarget<'a> {
    pub graph: &'a mut SceneGraph,
    pub camera: &'a mut OrbitCamera,
    pub transform: &'a mut SceneTransform,
    pub selection: &'a mut SelectionState,
    pub viewport: Rect,
}

#[derive(Copy, Clone, Debug)]
pub struct InputRouter {
    mode: ViewMode,
}

impl InputRouter {
    pub fn new(mode: ViewMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn dispatch(&self, gesture: GestureEvent, t: &mut RouteTarget<'_>) -> RouteOutcome {
        match gesture {
            GestureEvent::Tap { pos } => {
                let ray = t.camera.ray_from_screen(pos, t.viewport);
                self.select_with_ray(&ray, t)
            }
            GestureEvent::Drag { delta } => {
                t.camera.orbit(delta);
                RouteOutcome::Orbited
            }
            GestureEvent::Pinch { scale, .. } => match self.mode {
                // spreading fingers brings the camera closer
                ViewMode::Desktop => {
                    t.camera.zoom_by(1.0 / scale);
                    RouteOutcome::Zoomed
                }
                ViewMode::Ar => {
                    t.transform.scale_by(scale);
                    RouteOutcome::Scaled
                }
            },
            GestureEvent::LongPress { .. } => RouteOutcome::RotateArmed,
            GestureEvent::Rotate { delta } => {
                t.transform.rotate(delta.x);
                RouteOutcome::Rotated
            }
            GestureEvent::Scroll { delta } => {
                t.camera.scroll(delta);
                RouteOutcome::Zoomed
            }
        }
    }

    /// Hit test along a ray (pointer or XR controller) and select the nearest node.
    pub fn select_with_ray(&self, ray: &Ray, t: &mut RouteTarget<'_>) -> RouteOutcome {
        match picking::pick_node(t.graph, ray, self.mode, t.transform) {
            Some(idx) if t.selection.select(t.graph, idx) => RouteOutcome::Selected(idx),
            _ => RouteOutcome::Missed,
        }
    }
}
