//! Application configuration loaded from `config.toml`.
//!
//! Every section is optional. Missing sections and fields fall back to the
//! defaults, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::common::constants::{DEFAULT_MAX_CANDLES, LOG_FILE_PREFIX};
use crate::logging::{LogRotation, LoggingConfig};
use crate::volume_profile::structs::VolumeProfileConfig;

const DEFAULT_LOG_CLEANUP_DAYS: u32 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Range resolution settings from config.toml
#[derive(Debug, Clone, Deserialize)]
struct RangeTomlConfig {
    pub data_dir: Option<String>,
    pub max_candles: Option<i64>,
}

/// Logging configuration from config.toml
#[derive(Debug, Clone, Deserialize)]
struct LoggingTomlConfig {
    pub log_dir: Option<String>,
    pub level_filter: Option<String>,
    pub rotation: Option<String>, // "daily" or "hourly"
    pub console_timestamps: Option<bool>,
    pub file_json_format: Option<bool>,
    pub cleanup_days: Option<u32>,
}

/// Full TOML configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
struct TomlConfig {
    pub volume_profile: Option<VolumeProfileConfig>,
    pub range: Option<RangeTomlConfig>,
    pub logging: Option<LoggingTomlConfig>,
}

/// Where candles come from and how many one profile may use
#[derive(Debug, Clone, PartialEq)]
pub struct RangeConfig {
    /// Directory holding `<ASSET>_<interval>.csv` files
    pub data_dir: PathBuf,
    /// Upper bound on candles per resolved window (default: 5000)
    pub max_candles: i64,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            max_candles: DEFAULT_MAX_CANDLES,
        }
    }
}

/// Application configuration (converted from TOML)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub volume_profile: VolumeProfileConfig,
    pub range: RangeConfig,
    pub logging: LoggingConfig,
    /// Days to keep rotated log files
    pub log_cleanup_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            volume_profile: VolumeProfileConfig::default(),
            range: RangeConfig::default(),
            logging: LoggingConfig::default(),
            log_cleanup_days: DEFAULT_LOG_CLEANUP_DAYS,
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a config.toml file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let toml_config: TomlConfig = toml::from_str(content)?;
        let config = Self::from_toml_config(toml_config)?;
        config.validate()?;
        Ok(config)
    }

    fn from_toml_config(toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let range = match toml_config.range {
            Some(range) => RangeConfig {
                data_dir: range
                    .data_dir
                    .map(PathBuf::from)
                    .unwrap_or_else(|| RangeConfig::default().data_dir),
                max_candles: range.max_candles.unwrap_or(DEFAULT_MAX_CANDLES),
            },
            None => RangeConfig::default(),
        };

        // Convert logging configuration with fallback to defaults
        let (logging, log_cleanup_days) = if let Some(log_config) = toml_config.logging {
            let rotation = match log_config.rotation {
                Some(name) => parse_rotation(&name)?,
                None => LogRotation::Daily,
            };

            let config = LoggingConfig {
                log_dir: log_config.log_dir.unwrap_or_else(|| "logs".to_string()),
                level_filter: log_config
                    .level_filter
                    .unwrap_or_else(|| format!("info,{}=info", LOG_FILE_PREFIX)),
                rotation,
                console_timestamps: log_config.console_timestamps.unwrap_or(true),
                file_json_format: log_config.file_json_format.unwrap_or(true),
            };
            (config, log_config.cleanup_days.unwrap_or(DEFAULT_LOG_CLEANUP_DAYS))
        } else {
            (LoggingConfig::default(), DEFAULT_LOG_CLEANUP_DAYS)
        };

        Ok(Self {
            volume_profile: toml_config.volume_profile.unwrap_or_default(),
            range,
            logging,
            log_cleanup_days,
        })
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.volume_profile.validate().map_err(ConfigError::Invalid)?;

        if self.range.max_candles <= 0 {
            return Err(ConfigError::Invalid(format!(
                "max_candles must be positive, got {}",
                self.range.max_candles
            )));
        }

        Ok(())
    }
}

fn parse_rotation(value: &str) -> Result<LogRotation, ConfigError> {
    LogRotation::from_name(value).ok_or_else(|| {
        ConfigError::Invalid(format!(
            "logging rotation must be \"daily\" or \"hourly\", got \"{}\"",
            value
        ))
    })
}
