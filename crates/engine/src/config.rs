use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "gauge_config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GaugeConfig {
    pub channel: ChannelConfig,
    pub host: HostConfig,
    pub tier: TierConfig,
    pub power_supply: PowerSupplyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub name: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "flutter-course/battery".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    /// Platform API level of the host; unset means legacy.
    pub api_level: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct TierConfig {
    pub modern_min_api_level: u32,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            modern_min_api_level: 21,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PowerSupplyConfig {
    pub sysfs_root: PathBuf,
    pub device: Option<String>,
}

impl Default for PowerSupplyConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys/class/power_supply"),
            device: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LoggingFormatConfig,
    pub levels: LoggingLevelsConfig,
    pub redaction: RedactionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingFormatConfig {
    pub show_time: bool,
    pub show_file: bool,
    pub show_line: bool,
}

impl Default for LoggingFormatConfig {
    fn default() -> Self {
        Self {
            show_time: true,
            show_file: false,
            show_line: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingLevelsConfig {
    pub debug: bool,
    pub info: bool,
    pub warning: bool,
    pub error: bool,
}

impl Default for LoggingLevelsConfig {
    fn default() -> Self {
        Self {
            debug: false,
            info: false,
            warning: true,
            error: true,
        }
    }
}

impl LoggingLevelsConfig {
    /// The most verbose level enabled, as an `EnvFilter` directive.
    pub fn directive(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.info {
            "info"
        } else if self.warning {
            "warn"
        } else if self.error {
            "error"
        } else {
            "off"
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedactionConfig {
    pub enabled: bool,
    pub patterns: Vec<RedactionPattern>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedactionPattern {
    pub name: String,
    pub regex: String,
    pub placeholder: String,
}

/// Load configuration from an explicit file (must exist) or the default file
/// in the working directory (optional), then `APP__*` environment variables.
pub fn load_config(path: Option<&Path>) -> Result<GaugeConfig, ConfigError> {
    let file = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound(p.to_path_buf()));
            }
            File::from(p.to_path_buf()).required(true)
        }
        None => File::from(PathBuf::from(DEFAULT_CONFIG_FILE)).required(false),
    };

    let builder = Config::builder()
        .add_source(file)
        // Nested env vars like APP__HOST__API_LEVEL=29
        .add_source(Environment::with_prefix("APP").separator("__"));

    Ok(builder.build()?.try_deserialize()?)
}
