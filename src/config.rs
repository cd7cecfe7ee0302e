use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::map::projection::{MAX_ZOOM, MIN_ZOOM};
use crate::map::{DisplaySettings, RenderOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_center_lat() -> f64 {
    20.0
}
fn default_zoom() -> f64 {
    1.0
}

/// Initial view
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ViewConfig {
    #[serde(default)]
    pub center_lon: f64,
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center_lon: 0.0,
            center_lat: default_center_lat(),
            zoom: default_zoom(),
        }
    }
}

/// `tui-polymap.toml`; every key is optional
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub render: RenderOptions,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub view: ViewConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            render: RenderOptions::default(),
            display: DisplaySettings::default(),
            view: ViewConfig::default(),
        }
    }
}

/// Command-line values that win over the file
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub no_culling: bool,
    pub no_simplify: bool,
    pub high_quality: bool,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub zoom: Option<f64>,
}

impl FileConfig {
    /// Load `explicit` if given (it must exist and parse), otherwise the first
    /// readable, valid file on the search path, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)?;
            info!(path = %path.display(), "loaded config");
            return Ok(config);
        }

        for path in config_paths() {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded config");
                    return Ok(config);
                }
                Err(e) => warn!(error = %e, "skipping config file"),
            }
        }

        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(dir) = &overrides.data_dir {
            self.data_dir = dir.clone();
        }
        if overrides.no_culling {
            self.render.culling = false;
        }
        if overrides.no_simplify {
            self.render.simplify = false;
        }
        if overrides.high_quality {
            self.render.high_quality = true;
        }
        if let Some(lon) = overrides.lon {
            self.view.center_lon = lon;
        }
        if let Some(lat) = overrides.lat {
            self.view.center_lat = lat;
        }
        if let Some(zoom) = overrides.zoom {
            self.view.zoom = zoom;
        }
        self.view.zoom = self.view.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

fn config_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("tui-polymap.toml"), PathBuf::from(".tui-polymap.toml")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert!(config.render.culling);
        assert!(config.render.simplify);
        assert!(!config.render.high_quality);
        assert_eq!(config.view.center_lat, 20.0);
    }

    #[test]
    fn test_partial_sections() {
        let config: FileConfig = toml::from_str(
            r#"
            data_dir = "polygons"
            [render]
            high_quality = true
            [display]
            show_labels = false
            [view]
            zoom = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("polygons"));
        assert!(config.render.culling);
        assert!(config.render.high_quality);
        assert!(config.display.show_fill);
        assert!(!config.display.show_labels);
        assert_eq!(config.view.zoom, 4.0);
        assert_eq!(config.view.center_lat, 20.0);
    }

    #[test]
    fn test_overrides_win() {
        let mut config = FileConfig::default();
        config.apply(&Overrides {
            data_dir: Some(PathBuf::from("elsewhere")),
            no_culling: true,
            no_simplify: true,
            high_quality: true,
            lon: Some(12.5),
            lat: None,
            zoom: Some(42.0),
        });

        assert_eq!(config.data_dir, PathBuf::from("elsewhere"));
        assert!(!config.render.culling);
        assert!(!config.render.simplify);
        assert!(config.render.high_quality);
        assert_eq!(config.view.center_lon, 12.5);
        assert_eq!(config.view.center_lat, 20.0);
        assert_eq!(config.view.zoom, MAX_ZOOM);
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[render]\nculling = false\n").unwrap();

        let config = FileConfig::load(Some(&path)).unwrap();
        assert!(!config.render.culling);
    }

    #[test]
    fn test_explicit_file_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.toml");
        assert!(matches!(FileConfig::load(Some(&missing)), Err(ConfigError::Io { .. })));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[render\nculling = 3").unwrap();
        assert!(matches!(FileConfig::load(Some(&bad)), Err(ConfigError::Parse { .. })));
    }
}
