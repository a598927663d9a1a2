use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

use super::settings::AppSettings;
use crate::graph_utils::layout::ViewMode;
use crate::scene::camera::CameraState;
use crate::scene::SceneTransform;

const VIEW_STATE_FILE: &str = "view.ron";

/// Last camera and placement for a data source, restored on the next open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewStateFile {
    pub source: Option<String>,
    pub mode: ViewMode,
    pub camera: CameraState,
    pub scene_scale: f32,
    pub scene_rotation: f32,
    #[serde(default)]
    pub saved_at: String,
}

impl ViewStateFile {
    pub fn from_runtime(source: Option<String>, mode: ViewMode, camera: CameraState, transform: &SceneTransform) -> Self {
        Self {
            source,
            mode,
            camera,
            scene_scale: transform.scale,
            scene_rotation: transform.rotation_y,
            saved_at: now_stamp(),
        }
    }

    /// Whether this snapshot belongs to the given source and mode.
    pub fn matches(&self, source: Option<&str>, mode: ViewMode) -> bool {
        self.mode == mode && self.source.as_deref() == source
    }

    pub fn transform(&self) -> SceneTransform {
        let mut t = SceneTransform { scale: 1.0, rotation_y: self.scene_rotation };
        t.scale_by(self.scene_scale);
        t
    }
}

fn now_stamp() -> String {
    let now = OffsetDateTime::now_utc();
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    now.format(fmt).unwrap_or_else(|_| "unknown".to_string())
}

pub fn view_state_path(dir: &Path) -> PathBuf {
    dir.join(VIEW_STATE_FILE)
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("ron.tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

pub fn save_view_state_in(dir: &Path, state: &ViewStateFile) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let pretty = PrettyConfig::new().separate_tuple_members(true);
    let s = ron::ser::to_string_pretty(state, pretty)?;
    let path = view_state_path(dir);
    atomic_write(&path, s.as_bytes())?;
    Ok(path)
}

pub fn load_view_state_in(dir: &Path) -> anyhow::Result<Option<ViewStateFile>> {
    let path = view_state_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let mut f = File::open(&path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let state: ViewStateFile = ron::from_str(&buf)?;
    Ok(Some(state))
}

pub fn save_view_state(settings: &AppSettings, state: &ViewStateFile) -> anyhow::Result<PathBuf> {
    save_view_state_in(&settings.state_dir(), state)
}

pub fn load_view_state(settings: &AppSettings) -> anyhow::Result<Option<ViewStateFile>> {
    load_view_state_in(&settings.state_dir())
}
