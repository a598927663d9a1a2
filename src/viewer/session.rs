use std::collections::BTreeMap;

use egui::{Pos2, Rect};

use super::xr::ControllerSelect;
use crate::graph_utils::graph::{build_scene_graph, GraphDocument, SceneGraph};
use crate::graph_utils::layout::{apply_layout, ViewMode};
use crate::gui::info_panel::InfoPanel;
use crate::interaction::gesture::{GestureClassifier, PointerEvent};
use crate::interaction::router::{InputRouter, RouteOutcome, RouteTarget};
use crate::interaction::selection::SelectionState;
use crate::persistence::persist::ViewStateFile;
use crate::persistence::settings::AppSettings;
use crate::scene::camera::OrbitCamera;
use crate::scene::picking;
use crate::scene::SceneTransform;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub nodes: usize,
    pub links: usize,
    pub types: BTreeMap<String, usize>,
    pub selected: Option<String>,
}

/// Everything one viewer instance owns. Built per mode; switching mode or
/// closing the viewer drops the session, which also drops the selection.
pub struct ViewerSession {
    mode: ViewMode,
    graph: SceneGraph,
    camera: OrbitCamera,
    transform: SceneTransform,
    selection: SelectionState,
    classifier: GestureClassifier,
    router: InputRouter,
    zoom_step: f32,
    info_max_chars: usize,
    rotate_armed: bool,
}

impl ViewerSession {
    pub fn new(doc: &GraphDocument, mode: ViewMode, settings: &AppSettings) -> Self {
        let mut graph = build_scene_graph(doc);
        apply_layout(&mut graph, mode, settings.layout, settings.layout_seed, settings.force_warmup_ticks);

        let (min_distance, max_distance) = settings.camera_distance_range();
        let mut camera = OrbitCamera::for_mode(mode, min_distance, max_distance);
        if let Some((center, radius)) = graph.bounds() {
            camera.fit(center, radius);
            camera.set_home();
        }
        log::info!(
            "{} session ready: {} nodes, {} links",
            mode.as_str(),
            graph.node_count(),
            graph.link_count()
        );

        Self {
            mode,
            graph,
            camera,
            transform: SceneTransform::default(),
            selection: SelectionState::new(),
            classifier: GestureClassifier::new(settings.gestures),
            router: InputRouter::new(mode),
            zoom_step: settings.zoom_step.max(1.01),
            info_max_chars: settings.info_value_max_chars,
            rotate_armed: false,
        }
    }

    pub fn mode(&self) -> ViewMode { self.mode }
    pub fn graph(&self) -> &SceneGraph { &self.graph }
    pub fn camera(&self) -> &OrbitCamera { &self.camera }
    pub fn transform(&self) -> &SceneTransform { &self.transform }
    pub fn selection(&self) -> &SelectionState { &self.selection }
    pub fn rotate_armed(&self) -> bool { self.rotate_armed }

    fn target(&mut self, viewport: Rect) -> RouteTarget<'_> {
        RouteTarget {
            graph: &mut self.graph,
            camera: &mut self.camera,
            transform: &mut self.transform,
            selection: &mut self.selection,
            viewport,
        }
    }

    /// Feed one raw input event through the classifier and route the result.
    pub fn handle_pointer(&mut self, event: PointerEvent, viewport: Rect) -> Vec<RouteOutcome> {
        let gestures = self.classifier.handle(event);
        if self.classifier.is_idle() {
            self.rotate_armed = false;
        }
        let router = self.router;
        let mut target = self.target(viewport);
        gestures.into_iter().map(|g| router.dispatch(g, &mut target)).collect()
    }

    /// Advance gesture timers (long press).
    pub fn tick(&mut self, now: f64, viewport: Rect) -> Option<RouteOutcome> {
        let gesture = self.classifier.tick(now)?;
        let router = self.router;
        let outcome = router.dispatch(gesture, &mut self.target(viewport));
        if outcome == RouteOutcome::RotateArmed {
            self.rotate_armed = true;
        }
        Some(outcome)
    }

    pub fn long_press_pending(&self) -> bool {
        self.classifier.long_press_pending()
    }

    /// Node under a screen position, without touching the selection.
    pub fn node_at(&self, pos: Pos2, viewport: Rect) -> Option<usize> {
        let ray = self.camera.ray_from_screen(pos, viewport);
        picking::pick_node(&self.graph, &ray, self.mode, &self.transform)
    }

    pub fn handle_controller_select(&mut self, select: &ControllerSelect) -> RouteOutcome {
        let router = self.router;
        // viewport is unused for ray selection
        let mut target = self.target(Rect::NOTHING);
        router.select_with_ray(&select.ray(), &mut target)
    }

    pub fn clear_selection(&mut self) {
        self.selection.reset(&mut self.graph);
    }

    /// Keyboard/button reset: selection back to Idle and the camera home.
    pub fn reset_view(&mut self) {
        self.clear_selection();
        self.camera.reset();
        self.transform = SceneTransform::default();
    }

    /// Frame all nodes.
    pub fn fit_view(&mut self) {
        if let Some((center, radius)) = self.graph.bounds() {
            self.camera.fit(self.transform.apply(center), radius * self.transform.scale);
        }
    }

    pub fn zoom_in(&mut self) {
        self.camera.zoom_by(1.0 / self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.camera.zoom_by(self.zoom_step);
    }

    pub fn selected_info(&self) -> Option<InfoPanel> {
        let idx = self.selection.selected()?;
        let node = self.graph.node(idx)?;
        Some(InfoPanel::from_entity(&node.entity, self.info_max_chars))
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            nodes: self.graph.node_count(),
            links: self.graph.link_count(),
            types: self.graph.type_counts(),
            selected: self
                .selection
                .selected()
                .and_then(|i| self.graph.node(i))
                .map(|n| n.entity.display_name().to_string()),
        }
    }

    pub fn view_state(&self, source: Option<String>) -> ViewStateFile {
        ViewStateFile::from_runtime(source, self.mode, self.camera.state(), &self.transform)
    }

    pub fn restore_view(&mut self, state: &ViewStateFile) {
        self.camera.restore(&state.camera);
        self.transform = state.transform();
    }
}
