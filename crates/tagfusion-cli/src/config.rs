//! Configuration file – reads/writes `~/.tagfusion/config.toml`.
//!
//! ```toml
//! dropout_scale = 0.6
//! occlusion_window_s = 0.15
//!
//! [[cameras]]
//! name = "limelight-left"
//! offset_x_inches = 8.41
//!
//! [[tags]]
//! id = 7
//! x_m = 1.0
//! y_m = 2.0
//! heading_deg = 180.0
//! z_m = 0.5
//! ```
//!
//! Every camera field has a default (a nameless camera is `limelight`), and
//! an empty `cameras` list selects the built-in left/right pair.  A file that
//! cannot be parsed is ignored in favour of the built-in defaults.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tagfusion_types::config::{
    DEFAULT_CAMERA_NAME, DEFAULT_DROPOUT_SCALE, DEFAULT_OCCLUSION_WINDOW_S,
};
use tagfusion_types::{CameraConfig, FusionConfig, FusionError, TagLayout, TagPose};
use tracing::{debug, warn};

/// Overrides `dropout_scale`.
pub const DROPOUT_SCALE_ENV: &str = "TAGFUSION_DROPOUT_SCALE";
/// Overrides `occlusion_window_s`.
pub const OCCLUSION_WINDOW_ENV: &str = "TAGFUSION_OCCLUSION_WINDOW";

/// One `[[tags]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagEntry {
    pub id: i32,
    pub x_m: f64,
    pub y_m: f64,
    pub heading_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_m: Option<f64>,
}

impl TagEntry {
    fn pose(&self) -> TagPose {
        TagPose {
            x_m: self.x_m,
            y_m: self.y_m,
            heading_deg: self.heading_deg,
            z_m: self.z_m,
        }
    }
}

/// Persisted engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Confidence and correction scale applied while a camera is degraded.
    #[serde(default = "default_dropout_scale")]
    pub dropout_scale: f64,

    /// Seconds within which an all-lost tick counts as occlusion.
    #[serde(default = "default_occlusion_window")]
    pub occlusion_window_s: f64,

    #[serde(default)]
    pub cameras: Vec<CameraConfig>,

    #[serde(default)]
    pub tags: Vec<TagEntry>,
}

fn default_dropout_scale() -> f64 {
    DEFAULT_DROPOUT_SCALE
}
fn default_occlusion_window() -> f64 {
    DEFAULT_OCCLUSION_WINDOW_S
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dropout_scale: default_dropout_scale(),
            occlusion_window_s: default_occlusion_window(),
            cameras: CameraConfig::default_pair(),
            tags: Vec::new(),
        }
    }
}

impl Config {
    /// Drop entries the engine cannot address unambiguously, keeping the
    /// first camera of each name and the first placement of each tag id.
    /// Blank camera names are replaced with [`DEFAULT_CAMERA_NAME`].
    pub fn dedup(&mut self) {
        let mut names = HashSet::new();
        self.cameras.retain_mut(|cam| {
            if cam.name.trim().is_empty() {
                cam.name = DEFAULT_CAMERA_NAME.to_string();
            }
            let first = names.insert(cam.name.clone());
            if !first {
                warn!(camera = %cam.name, "duplicate camera name; later entry ignored");
            }
            first
        });
        let mut ids = HashSet::new();
        self.tags.retain(|tag| {
            let first = ids.insert(tag.id);
            if !first {
                warn!(tag = tag.id, "duplicate tag id; later entry ignored");
            }
            first
        });
    }

    /// Engine configuration, with the default camera fallback and clamping
    /// applied.
    pub fn to_fusion_config(&self) -> FusionConfig {
        FusionConfig::with_cameras(
            self.cameras.clone(),
            self.dropout_scale,
            self.occlusion_window_s,
        )
    }

    pub fn tag_layout(&self) -> TagLayout {
        self.tags.iter().map(|t| (t.id, t.pose())).collect()
    }
}

/// Return the path to `~/.tagfusion/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".tagfusion").join("config.toml")
}

/// Load `path` (or the default path), then apply environment overrides.
///
/// A missing file, or one that cannot be read or parsed, yields
/// [`Config::default`]; the engine always gets a usable configuration.
pub fn load(path: Option<&Path>) -> Config {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    let mut cfg = match load_from(&path) {
        Ok(Some(cfg)) => cfg,
        Ok(None) => {
            debug!(path = %path.display(), "no config file; using built-in defaults");
            Config::default()
        }
        Err(e) => {
            warn!(error = %e, "config unusable; using built-in defaults");
            Config::default()
        }
    };
    apply_env_overrides(&mut cfg);
    cfg.dedup();
    cfg
}

/// Parse the config at `path`.  Returns `None` if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<Config>, FusionError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| FusionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| FusionError::Config(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(cfg))
}

/// Apply `TAGFUSION_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `TAGFUSION_DROPOUT_SCALE` | `dropout_scale` |
/// | `TAGFUSION_OCCLUSION_WINDOW` | `occlusion_window_s` |
///
/// Values that do not parse as numbers are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup(DROPOUT_SCALE_ENV)
        && let Ok(scale) = v.trim().parse::<f64>()
    {
        cfg.dropout_scale = scale;
    }
    if let Some(v) = lookup(OCCLUSION_WINDOW_ENV)
        && let Ok(window) = v.trim().parse::<f64>()
    {
        cfg.occlusion_window_s = window;
    }
}

/// Write `cfg` to `path`, creating parent directories as needed.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), FusionError> {
    let io_err = |source| FusionError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| FusionError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(path, raw).map_err(io_err)
}
