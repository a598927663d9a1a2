use egui::{pos2, vec2, Pos2, Rect};
use glam::{Quat, Vec3};
use kg_viewer::graph_utils::graph::{build_scene_graph, GraphDocument, NodeVisual};
use kg_viewer::graph_utils::layout::ViewMode;
use kg_viewer::interaction::gesture::{GestureClassifier, GestureEvent, PointerEvent, PointerKind};
use kg_viewer::interaction::router::RouteOutcome;
use kg_viewer::interaction::selection::{Selection, SelectionState};
use kg_viewer::persistence::settings::AppSettings;
use kg_viewer::viewer::session::ViewerSession;
use kg_viewer::viewer::xr::{ControllerSelect, NativeXr, SimulatedXr, XrRuntime};
use serde_json::json;

const MOUSE: u64 = 0;

fn viewport() -> Rect {
    Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))
}

fn sample_doc() -> GraphDocument {
    serde_json::from_value(json!({
        "entities": [
            {"id": "a", "label": "Alpha", "type": "Concept"},
            {"id": "b", "label": "Beta", "type": "Concept"},
            {"id": "c", "label": "Gamma", "type": "Concept"}
        ],
        "relationships": [{"source": "a", "target": "b"}]
    }))
    .expect("sample doc")
}

fn session(mode: ViewMode) -> ViewerSession {
    ViewerSession::new(&sample_doc(), mode, &AppSettings::default())
}

// Screen position of a node's center
fn screen_pos(s: &ViewerSession, id: &str) -> Pos2 {
    let node = s.graph().node_by_id(id).expect("node");
    s.camera()
        .project(s.transform().apply(node.position), viewport())
        .expect("node in front of camera")
        .pos
}

fn click(s: &mut ViewerSession, pos: Pos2) -> Vec<RouteOutcome> {
    let mut out = s.handle_pointer(PointerEvent::Down { id: MOUSE, kind: PointerKind::Mouse, pos, time: 0.0 }, viewport());
    out.extend(s.handle_pointer(PointerEvent::Up { id: MOUSE, pos, time: 0.1 }, viewport()));
    out
}

fn touch_down(id: u64, pos: Pos2, time: f64) -> PointerEvent {
    PointerEvent::Down { id, kind: PointerKind::Touch, pos, time }
}

#[test]
fn quick_still_contact_is_a_tap_at_origin() {
    let mut c = GestureClassifier::default();
    assert!(c.handle(touch_down(1, pos2(100.0, 100.0), 0.0)).is_empty());
    assert!(c.handle(PointerEvent::Move { id: 1, pos: pos2(104.0, 102.0), time: 0.05 }).is_empty());
    let out = c.handle(PointerEvent::Up { id: 1, pos: pos2(104.0, 102.0), time: 0.1 });
    assert_eq!(out, vec![GestureEvent::Tap { pos: pos2(100.0, 100.0) }]);
    assert!(c.is_idle());
}

#[test]
fn moving_past_threshold_drags_instead_of_tapping() {
    let mut c = GestureClassifier::default();
    c.handle(PointerEvent::Down { id: MOUSE, kind: PointerKind::Mouse, pos: pos2(0.0, 0.0), time: 0.0 });
    let out = c.handle(PointerEvent::Move { id: MOUSE, pos: pos2(12.0, 0.0), time: 0.02 });
    assert_eq!(out, vec![GestureEvent::Drag { delta: vec2(12.0, 0.0) }]);
    let out = c.handle(PointerEvent::Move { id: MOUSE, pos: pos2(15.0, 1.0), time: 0.04 });
    assert_eq!(out, vec![GestureEvent::Drag { delta: vec2(3.0, 1.0) }]);
    // back at the start does not turn it into a tap
    c.handle(PointerEvent::Move { id: MOUSE, pos: pos2(0.0, 0.0), time: 0.06 });
    assert!(c.handle(PointerEvent::Up { id: MOUSE, pos: pos2(0.0, 0.0), time: 0.08 }).is_empty());
}

#[test]
fn slow_touch_is_not_a_tap_but_slow_click_is() {
    let mut c = GestureClassifier::default();
    c.handle(touch_down(1, pos2(5.0, 5.0), 0.0));
    // lifted before the long-press tick ran, but after the tap window
    assert!(c.handle(PointerEvent::Up { id: 1, pos: pos2(5.0, 5.0), time: 0.45 }).is_empty());

    c.handle(PointerEvent::Down { id: MOUSE, kind: PointerKind::Mouse, pos: pos2(5.0, 5.0), time: 1.0 });
    let out = c.handle(PointerEvent::Up { id: MOUSE, pos: pos2(5.0, 5.0), time: 2.0 });
    assert_eq!(out, vec![GestureEvent::Tap { pos: pos2(5.0, 5.0) }]);
}

#[test]
fn pinch_never_yields_a_tap() {
    let mut c = GestureClassifier::default();
    c.handle(touch_down(1, pos2(100.0, 100.0), 0.0));
    c.handle(touch_down(2, pos2(200.0, 100.0), 0.01));
    let out = c.handle(PointerEvent::Move { id: 2, pos: pos2(300.0, 100.0), time: 0.05 });
    match out.as_slice() {
        [GestureEvent::Pinch { scale, center }] => {
            assert!((scale - 2.0).abs() < 1e-4);
            assert_eq!(*center, pos2(200.0, 100.0));
        }
        other => panic!("expected a pinch, got {:?}", other),
    }
    assert!(c.handle(PointerEvent::Up { id: 2, pos: pos2(300.0, 100.0), time: 0.1 }).is_empty());
    assert!(c.handle(PointerEvent::Up { id: 1, pos: pos2(100.0, 100.0), time: 0.12 }).is_empty());
    assert!(c.is_idle());
}

#[test]
fn long_press_arms_rotation() {
    let mut c = GestureClassifier::default();
    c.handle(touch_down(1, pos2(50.0, 50.0), 0.0));
    assert!(c.long_press_pending());
    assert_eq!(c.tick(0.2), None);
    assert_eq!(c.tick(0.5), Some(GestureEvent::LongPress { pos: pos2(50.0, 50.0) }));
    assert!(!c.long_press_pending());
    let out = c.handle(PointerEvent::Move { id: 1, pos: pos2(70.0, 50.0), time: 0.6 });
    assert_eq!(out, vec![GestureEvent::Rotate { delta: vec2(20.0, 0.0) }]);
    assert!(c.handle(PointerEvent::Up { id: 1, pos: pos2(70.0, 50.0), time: 0.7 }).is_empty());
}

#[test]
fn moving_touch_cancels_long_press() {
    let mut c = GestureClassifier::default();
    let delay = c.config().long_press_delay;
    c.handle(touch_down(1, pos2(50.0, 50.0), 0.0));
    assert!(c.long_press_pending());
    let out = c.handle(PointerEvent::Move { id: 1, pos: pos2(65.0, 50.0), time: delay * 0.5 });
    assert_eq!(out, vec![GestureEvent::Drag { delta: vec2(15.0, 0.0) }]);
    assert!(!c.long_press_pending());
    assert_eq!(c.tick(delay + 0.01), None);
    let out = c.handle(PointerEvent::Move { id: 1, pos: pos2(70.0, 52.0), time: delay + 0.02 });
    assert_eq!(out, vec![GestureEvent::Drag { delta: vec2(5.0, 2.0) }]);
    assert!(c.handle(PointerEvent::Up { id: 1, pos: pos2(70.0, 52.0), time: delay + 0.05 }).is_empty());
}

#[test]
fn mouse_never_long_presses() {
    let mut c = GestureClassifier::default();
    c.handle(PointerEvent::Down { id: MOUSE, kind: PointerKind::Mouse, pos: pos2(1.0, 1.0), time: 0.0 });
    assert!(!c.long_press_pending());
    assert_eq!(c.tick(5.0), None);
}

#[test]
fn wheel_passes_through_as_scroll() {
    let mut c = GestureClassifier::default();
    assert_eq!(c.handle(PointerEvent::Wheel { delta: 40.0 }), vec![GestureEvent::Scroll { delta: 40.0 }]);
    assert!(c.handle(PointerEvent::Wheel { delta: 0.0 }).is_empty());
}

#[test]
fn selecting_b_after_a_reverts_a() {
    let mut graph = build_scene_graph(&sample_doc());
    let mut sel = SelectionState::new();
    assert!(sel.is_idle());
    assert!(sel.select(&mut graph, 0));
    assert!(sel.select(&mut graph, 1));
    assert_eq!(sel.current(), Selection::Selected(1));
    assert_eq!(graph.nodes[0].visual, NodeVisual::BASELINE);
    assert_eq!(graph.nodes[1].visual, NodeVisual::HIGHLIGHT);
    assert_eq!(graph.highlighted_count(), 1);

    sel.reset(&mut graph);
    assert!(sel.is_idle());
    assert_eq!(graph.highlighted_count(), 0);

    assert!(!sel.select(&mut graph, 99));
    assert!(sel.is_idle());
}

#[test]
fn tap_on_node_selects_it() {
    let mut s = session(ViewMode::Desktop);
    let pos = screen_pos(&s, "b");
    let idx = s.graph().node_index("b").expect("b");
    assert_eq!(click(&mut s, pos), vec![RouteOutcome::Selected(idx)]);
    assert_eq!(s.selection().selected(), Some(idx));
    let info = s.selected_info().expect("info");
    assert_eq!(info.label, "Beta");
    assert_eq!(s.stats().selected.as_deref(), Some("Beta"));
}

#[test]
fn tap_on_empty_space_keeps_selection() {
    let mut s = session(ViewMode::Desktop);
    let a = s.graph().node_index("a").expect("a");
    let pos = screen_pos(&s, "a");
    click(&mut s, pos);
    assert_eq!(click(&mut s, pos2(2.0, 2.0)), vec![RouteOutcome::Missed]);
    assert_eq!(s.selection().selected(), Some(a));
}

#[test]
fn drag_from_node_orbits_without_selecting() {
    let mut s = session(ViewMode::Desktop);
    let pos = screen_pos(&s, "a");
    let yaw = s.camera().yaw;
    s.handle_pointer(PointerEvent::Down { id: MOUSE, kind: PointerKind::Mouse, pos, time: 0.0 }, viewport());
    let out = s.handle_pointer(PointerEvent::Move { id: MOUSE, pos: pos + vec2(30.0, 0.0), time: 0.05 }, viewport());
    assert_eq!(out, vec![RouteOutcome::Orbited]);
    s.handle_pointer(PointerEvent::Up { id: MOUSE, pos: pos + vec2(30.0, 0.0), time: 0.1 }, viewport());
    assert!(s.selection().is_idle());
    assert_ne!(s.camera().yaw, yaw);
}

#[test]
fn reset_view_clears_selection_and_camera() {
    let mut s = session(ViewMode::Desktop);
    let home = s.camera().state();
    let pos = screen_pos(&s, "c");
    click(&mut s, pos);
    s.zoom_in();
    s.handle_pointer(PointerEvent::Wheel { delta: 120.0 }, viewport());
    s.reset_view();
    assert!(s.selection().is_idle());
    assert_eq!(s.graph().highlighted_count(), 0);
    assert_eq!(s.camera().state(), home);
}

#[test]
fn zoom_stays_within_range() {
    let settings = AppSettings::default();
    let mut s = session(ViewMode::Desktop);
    for _ in 0..100 {
        s.zoom_in();
    }
    assert!((s.camera().distance - settings.min_camera_distance).abs() < 1e-3);
    for _ in 0..100 {
        s.handle_pointer(PointerEvent::Wheel { delta: -500.0 }, viewport());
    }
    assert!((s.camera().distance - settings.max_camera_distance).abs() < 1e-3);
}

#[test]
fn ar_pinch_scales_the_graph() {
    let mut s = session(ViewMode::Ar);
    s.handle_pointer(touch_down(1, pos2(300.0, 300.0), 0.0), viewport());
    s.handle_pointer(touch_down(2, pos2(400.0, 300.0), 0.0), viewport());
    let out = s.handle_pointer(PointerEvent::Move { id: 2, pos: pos2(450.0, 300.0), time: 0.05 }, viewport());
    assert_eq!(out, vec![RouteOutcome::Scaled]);
    assert!((s.transform().scale - 1.5).abs() < 1e-4);
}

#[test]
fn long_press_then_drag_rotates_the_graph() {
    let mut s = session(ViewMode::Ar);
    s.handle_pointer(touch_down(1, pos2(10.0, 10.0), 0.0), viewport());
    assert!(s.long_press_pending());
    assert_eq!(s.tick(0.6, viewport()), Some(RouteOutcome::RotateArmed));
    assert!(s.rotate_armed());
    let out = s.handle_pointer(PointerEvent::Move { id: 1, pos: pos2(60.0, 10.0), time: 0.7 }, viewport());
    assert_eq!(out, vec![RouteOutcome::Rotated]);
    assert!(s.transform().rotation_y > 0.0);
    s.handle_pointer(PointerEvent::Up { id: 1, pos: pos2(60.0, 10.0), time: 0.8 }, viewport());
    assert!(!s.rotate_armed());
    assert!(s.selection().is_idle());
}

#[test]
fn controller_ray_selects_node() {
    let mut s = session(ViewMode::Ar);
    let target = s.transform().apply(s.graph().node_by_id("c").expect("c").position);
    let origin = Vec3::new(0.0, 1.0, 1.0);
    let select = ControllerSelect {
        position: origin,
        orientation: Quat::from_rotation_arc(Vec3::NEG_Z, (target - origin).normalize()),
    };
    let idx = s.graph().node_index("c").expect("c");
    assert_eq!(s.handle_controller_select(&select), RouteOutcome::Selected(idx));

    let away = ControllerSelect { position: origin, orientation: Quat::from_rotation_arc(Vec3::NEG_Z, Vec3::Y) };
    assert_eq!(s.handle_controller_select(&away), RouteOutcome::Missed);
    assert_eq!(s.selection().selected(), Some(idx));
}

#[test]
fn native_runtime_reports_ar_unsupported() {
    let cap = NativeXr.immersive_ar_support();
    assert!(!cap.is_supported());
    assert!(SimulatedXr.immersive_ar_support().is_supported());
}

#[test]
fn reversed_camera_range_does_not_panic() {
    let settings = AppSettings { min_camera_distance: 600.0, max_camera_distance: 500.0, ..AppSettings::default() };
    let mut s = ViewerSession::new(&sample_doc(), ViewMode::Desktop, &settings);
    for _ in 0..100 {
        s.zoom_in();
    }
    assert!((s.camera().distance - 500.0).abs() < 1e-3);
    for _ in 0..100 {
        s.zoom_out();
    }
    assert!((s.camera().distance - 600.0).abs() < 1e-3);

    let settings = AppSettings { min_camera_distance: f32::NAN, max_camera_distance: -1.0, ..AppSettings::default() };
    let s = ViewerSession::new(&sample_doc(), ViewMode::Ar, &settings);
    assert!(s.camera().distance.is_finite());
}
