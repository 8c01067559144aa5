//! Configuration for the zone bridge.
//!
//! Configuration is read from `~/.zone-bridge/zone-bridge.toml`, or from the
//! file named by `ZONE_BRIDGE_CONFIG`. A missing file is not an error: every
//! section has defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};

use zone_bridge::DEFAULT_POLL_BUDGET;
use zone_types::{SettingsError, ZoneSettings};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "ZONE_BRIDGE_CONFIG";

const fn default_poll_budget() -> usize {
    DEFAULT_POLL_BUDGET
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    #[serde(default)]
    pub event_loop: EventLoopConfig,
    /// Zones to create at startup, in file order.
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventLoopConfig {
    /// Tasks drained per poll. Values below 1 are treated as 1.
    #[serde(default = "default_poll_budget")]
    pub poll_budget: usize,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            poll_budget: DEFAULT_POLL_BUDGET,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneConfig {
    pub id: String,
    #[serde(default)]
    pub settings: toml::Table,
}

impl ZoneConfig {
    /// Settings in the form the bridge passes to a scheduler.
    pub fn zone_settings(&self) -> Result<ZoneSettings, SettingsError> {
        let mut map = serde_json::Map::new();
        for (key, value) in &self.settings {
            let json = toml_to_json(value)
                .ok_or_else(|| SettingsError::UnsupportedValue { key: key.clone() })?;
            map.insert(key.clone(), json);
        }
        ZoneSettings::from_json(&serde_json::Value::Object(map))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Convert a TOML value to JSON. `None` for floats JSON cannot represent.
fn toml_to_json(value: &toml::Value) -> Option<serde_json::Value> {
    match value {
        toml::Value::String(s) => Some(serde_json::Value::String(s.clone())),
        toml::Value::Integer(i) => Some(serde_json::Value::Number((*i).into())),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number),
        toml::Value::Boolean(b) => Some(serde_json::Value::Bool(*b)),
        toml::Value::Array(arr) => arr
            .iter()
            .map(toml_to_json)
            .collect::<Option<Vec<_>>>()
            .map(serde_json::Value::Array),
        toml::Value::Table(table) => {
            let mut map = serde_json::Map::new();
            for (k, v) in table {
                map.insert(k.clone(), toml_to_json(v)?);
            }
            Some(serde_json::Value::Object(map))
        }
        toml::Value::Datetime(dt) => Some(serde_json::Value::String(dt.to_string())),
    }
}

impl BridgeConfig {
    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No home directory; using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// Config file location: `ZONE_BRIDGE_CONFIG` if set, else under the home directory.
    #[must_use]
    pub fn path() -> Option<PathBuf> {
        match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => default_config_path(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".zone-bridge").join("zone-bridge.toml"))
}
