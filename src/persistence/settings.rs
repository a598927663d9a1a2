use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::graph_utils::layout::{LayoutKind, ViewMode};
use crate::gui::info_panel::DEFAULT_VALUE_MAX_CHARS;
use crate::interaction::gesture::GestureConfig;

const APP_DIR: &str = "KG-Viewer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    // If None, use OS default state directory
    #[serde(default)]
    pub state_override: Option<PathBuf>,
    // File path or http(s) URL loaded at startup when none is given on the command line
    #[serde(default)]
    pub default_source: Option<String>,
    #[serde(default)]
    pub mode: ViewMode,
    #[serde(default)]
    pub layout: LayoutKind,
    #[serde(default = "AppSettings::default_seed")]
    pub layout_seed: u64,
    #[serde(default = "AppSettings::default_warmup_ticks")]
    pub force_warmup_ticks: usize,
    #[serde(default)]
    pub gestures: GestureConfig,
    // Camera distance range in desktop scene units
    #[serde(default = "AppSettings::default_min_distance")]
    pub min_camera_distance: f32,
    #[serde(default = "AppSettings::default_max_distance")]
    pub max_camera_distance: f32,
    // Multiplicative step for the zoom buttons
    #[serde(default = "AppSettings::default_zoom_step")]
    pub zoom_step: f32,
    #[serde(default = "AppSettings::default_value_max_chars")]
    pub info_value_max_chars: usize,
    // Hide node labels when the graph is larger than this
    #[serde(default = "AppSettings::default_label_threshold")]
    pub label_hide_node_threshold: usize,
    // Restore the last camera when reopening the same source
    #[serde(default = "AppSettings::default_true")]
    pub restore_view: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            state_override: None,
            default_source: None,
            mode: ViewMode::Desktop,
            layout: LayoutKind::Tiered,
            layout_seed: Self::default_seed(),
            force_warmup_ticks: Self::default_warmup_ticks(),
            gestures: GestureConfig::default(),
            min_camera_distance: Self::default_min_distance(),
            max_camera_distance: Self::default_max_distance(),
            zoom_step: Self::default_zoom_step(),
            info_value_max_chars: Self::default_value_max_chars(),
            label_hide_node_threshold: Self::default_label_threshold(),
            restore_view: true,
        }
    }
}

impl AppSettings {
    fn config_dir() -> PathBuf {
        // Cross-platform user config dir
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/KG-Viewer
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join(APP_DIR);
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\KG-Viewer
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join(APP_DIR);
            }
            return PathBuf::from(APP_DIR);
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/KG-Viewer or ~/.config/KG-Viewer
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join(APP_DIR);
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join(APP_DIR);
        }
    }

    fn state_default_dir() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            let tmp = std::env::var_os("TMPDIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("/tmp"));
            return tmp.join(APP_DIR);
        }
        #[cfg(target_os = "windows")]
        {
            // %LOCALAPPDATA%\KG-Viewer\State else TEMP
            if let Ok(local) = std::env::var("LOCALAPPDATA") {
                return PathBuf::from(local).join(APP_DIR).join("State");
            }
            if let Ok(temp) = std::env::var("TEMP") {
                return PathBuf::from(temp).join(APP_DIR);
            }
            return PathBuf::from(APP_DIR);
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_STATE_HOME/kg-viewer or ~/.local/state/kg-viewer, else /tmp/KG-Viewer
            if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
                return PathBuf::from(xdg).join("kg-viewer");
            }
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(".local").join("state").join("kg-viewer");
            }
            return PathBuf::from("/tmp").join(APP_DIR);
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        let path = Self::settings_path();
        if path.exists() {
            return Self::load_from(&path);
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut f = fs::File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        let v: Self = serde_json::from_str(&s)?;
        Ok(v)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Camera distance range with hand-edited values repaired: non-finite or
    /// non-positive bounds fall back to the defaults and reversed bounds are swapped.
    pub fn camera_distance_range(&self) -> (f32, f32) {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        let min = if valid(self.min_camera_distance) { self.min_camera_distance } else { Self::default_min_distance() };
        let max = if valid(self.max_camera_distance) { self.max_camera_distance } else { Self::default_max_distance() };
        if min > max {
            log::warn!("min_camera_distance {} exceeds max_camera_distance {}; swapping", min, max);
            (max, min)
        } else {
            (min, max)
        }
    }

    /// Return the directory where the settings file (settings.json) is stored.
    pub fn settings_dir() -> PathBuf {
        Self::config_dir()
    }

    pub fn settings_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    pub fn state_dir(&self) -> PathBuf {
        if let Some(p) = &self.state_override { return p.clone(); }
        Self::state_default_dir()
    }

    pub(crate) fn default_seed() -> u64 { 0x6b67 }
    pub(crate) fn default_warmup_ticks() -> usize { 120 }
    pub(crate) fn default_min_distance() -> f32 { 10.0 }
    pub(crate) fn default_max_distance() -> f32 { 500.0 }
    pub(crate) fn default_zoom_step() -> f32 { 1.25 }
    pub(crate) fn default_value_max_chars() -> usize { DEFAULT_VALUE_MAX_CHARS }
    pub(crate) fn default_label_threshold() -> usize { 150 }
    pub(crate) fn default_true() -> bool { true }
}
