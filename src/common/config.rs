use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::downloader::engine::Engine;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub date: String,
    pub author: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Hikari Insta Downloader".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            date: String::new(),
            author: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSettings {
    pub default_engine: Engine,
    pub log_level: String,
    pub output_dir: PathBuf,
    pub download_timeout_secs: u64,
    pub version_check_timeout_secs: u64,
    /// Interpreter used for `pip install --upgrade`.
    pub python: String,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            default_engine: Engine::default(),
            log_level: "INFO".to_string(),
            output_dir: PathBuf::from("Downloads"),
            download_timeout_secs: 300,
            version_check_timeout_secs: 5,
            python: default_python().to_string(),
        }
    }
}

fn default_python() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// Display-only description of an engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineInfo {
    pub name: String,
    pub description: String,
    pub advantages: Vec<String>,
    pub recommended: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_info: AppInfo,
    pub default_settings: DefaultSettings,
    pub engines: BTreeMap<String, EngineInfo>,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path`, falling back to defaults when it is missing or broken.
    ///
    /// A missing file is normal. Any other problem is handed back so it can
    /// be reported once logging is up.
    pub fn load_or_default(path: &Path) -> (Self, Option<ConfigError>) {
        match Self::from_file(path) {
            Ok(config) => (config, None),
            Err(e) if e.is_not_found() => (Self::default(), None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.default_settings.download_timeout_secs)
    }

    pub fn version_check_timeout(&self) -> Duration {
        Duration::from_secs(self.default_settings.version_check_timeout_secs)
    }

    /// Engine descriptions from the config, or the built-in ones when the
    /// config has none.
    pub fn engine_infos(&self) -> Vec<(String, EngineInfo)> {
        if !self.engines.is_empty() {
            return self
                .engines
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }

        Engine::ALL
            .iter()
            .map(|engine| {
                let info = EngineInfo {
                    name: engine.display_name().to_string(),
                    description: engine.description().to_string(),
                    advantages: engine.advantages().iter().map(|s| s.to_string()).collect(),
                    recommended: *engine == self.default_settings.default_engine,
                };
                (engine.as_str().to_string(), info)
            })
            .collect()
    }
}
