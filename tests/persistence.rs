use kg_viewer::graph_utils::layout::{LayoutKind, ViewMode};
use kg_viewer::persistence::persist::{load_view_state, load_view_state_in, save_view_state, save_view_state_in, ViewStateFile};
use kg_viewer::persistence::settings::AppSettings;
use kg_viewer::scene::camera::CameraState;
use kg_viewer::scene::{SceneTransform, MAX_SCENE_SCALE};

fn sample_state(source: &str, mode: ViewMode) -> ViewStateFile {
    let camera = CameraState { target: (1.0, 2.0, 3.0), yaw: 0.5, pitch: 0.2, distance: 42.0 };
    let transform = SceneTransform { scale: 2.0, rotation_y: 1.0 };
    ViewStateFile::from_runtime(Some(source.to_string()), mode, camera, &transform)
}

#[test]
fn settings_round_trip_through_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("settings.json");
    let settings = AppSettings {
        default_source: Some("https://example.com/kg.json".into()),
        mode: ViewMode::Ar,
        layout: LayoutKind::Force,
        layout_seed: 99,
        ..AppSettings::default()
    };
    settings.save_to(&path).expect("save");
    let loaded = AppSettings::load_from(&path).expect("load");
    assert_eq!(loaded, settings);
}

#[test]
fn partial_settings_fill_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"layout":"force","gestures":{"tap_move_threshold_px":4.0,"tap_max_duration":0.2,"long_press_delay":0.8}}"#)
        .expect("write");
    let s = AppSettings::load_from(&path).expect("load");
    assert_eq!(s.layout, LayoutKind::Force);
    assert_eq!(s.gestures.tap_move_threshold_px, 4.0);
    assert_eq!(s.mode, ViewMode::Desktop);
    assert_eq!(s.info_value_max_chars, 200);
    assert!(s.restore_view);
}

#[test]
fn malformed_settings_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ nope").expect("write");
    assert!(AppSettings::load_from(&path).is_err());
}

#[test]
fn view_state_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(load_view_state_in(dir.path()).expect("empty dir").is_none());

    let state = sample_state("graph.json", ViewMode::Desktop);
    let path = save_view_state_in(dir.path(), &state).expect("save");
    assert!(path.exists());
    assert!(!path.with_extension("ron.tmp").exists());

    let loaded = load_view_state_in(dir.path()).expect("load").expect("some state");
    assert_eq!(loaded, state);
    assert!(!loaded.saved_at.is_empty());
    assert_eq!(loaded.transform(), SceneTransform { scale: 2.0, rotation_y: 1.0 });
}

#[test]
fn view_state_uses_settings_state_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = AppSettings { state_override: Some(dir.path().to_path_buf()), ..AppSettings::default() };
    let state = sample_state("https://example.com/kg.json", ViewMode::Ar);
    save_view_state(&settings, &state).expect("save");
    let loaded = load_view_state(&settings).expect("load").expect("state");
    assert!(loaded.matches(Some("https://example.com/kg.json"), ViewMode::Ar));
    assert!(!loaded.matches(Some("https://example.com/kg.json"), ViewMode::Desktop));
    assert!(!loaded.matches(Some("other.json"), ViewMode::Ar));
    assert!(!loaded.matches(None, ViewMode::Ar));
}

#[test]
fn restored_scale_is_clamped() {
    let mut state = sample_state("g.json", ViewMode::Ar);
    state.scene_scale = 1000.0;
    assert_eq!(state.transform().scale, MAX_SCENE_SCALE);
}

#[test]
fn camera_range_is_repaired() {
    let defaults = AppSettings::default();
    let expected = (defaults.min_camera_distance, defaults.max_camera_distance);
    assert_eq!(defaults.camera_distance_range(), expected);

    let swapped = AppSettings { min_camera_distance: 600.0, max_camera_distance: 50.0, ..AppSettings::default() };
    assert_eq!(swapped.camera_distance_range(), (50.0, 600.0));

    let broken = AppSettings { min_camera_distance: f32::NAN, max_camera_distance: 0.0, ..AppSettings::default() };
    assert_eq!(broken.camera_distance_range(), expected);

    let infinite = AppSettings { min_camera_distance: 5.0, max_camera_distance: f32::INFINITY, ..AppSettings::default() };
    assert_eq!(infinite.camera_distance_range(), (5.0, defaults.max_camera_distance));
}
