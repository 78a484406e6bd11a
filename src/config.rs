//! Configuration loading

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub gpsd: GpsdConfig,
    pub store: StoreConfig,
    pub map: MapConfig,
    pub magnetic: MagneticConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml_edit::de::from_str(text)?)
    }
}

/// gpsd connection settings
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GpsdConfig {
    /// host:port of the gpsd daemon (default: 127.0.0.1:2947)
    pub address: String,
}

impl Default for GpsdConfig {
    fn default() -> Self {
        GpsdConfig {
            address: "127.0.0.1:2947".to_string(),
        }
    }
}

/// Target persistence settings
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// File holding the persisted target (default: waypoint.toml)
    pub path: PathBuf,
    /// Table that scopes the keys to this session kind
    pub table: String,
    pub latitude_key: String,
    pub longitude_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from("waypoint.toml"),
            table: "waypoint".to_string(),
            latitude_key: "target_latitude".to_string(),
            longitude_key: "target_longitude".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Zoom level used when centering on the first fix (default: 15.0)
    pub zoom_level: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig { zoom_level: 15.0 }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MagneticConfig {
    /// Fixed declination in degrees; the World Magnetic Model is used when unset
    pub declination_override: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter directive, overridden by RUST_LOG
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "waypoint_nav=info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
[gpsd]
address = "10.0.0.2:2947"

[store]
path = "/var/lib/waypoint/target.toml"

[map]
zoom_level = 17.5

[magnetic]
declination_override = -3.25
"#,
        )
        .unwrap();
        assert_eq!(config.gpsd.address, "10.0.0.2:2947");
        assert_eq!(config.store.path, PathBuf::from("/var/lib/waypoint/target.toml"));
        assert_eq!(config.store.table, "waypoint");
        assert_eq!(config.map.zoom_level, 17.5);
        assert_eq!(config.magnetic.declination_override, Some(-3.25));
        assert_eq!(config.logging.filter, "waypoint_nav=info");
    }

    #[test]
    fn test_bad_type_is_rejected() {
        assert!(matches!(
            Config::parse("[map]\nzoom_level = \"close\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
