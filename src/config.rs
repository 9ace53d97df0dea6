//! Runtime configuration
//!
//! Loaded from TOML (`[dict]` and `[log]` tables, every field optional) or
//! from `ANYRT_*` environment variables. The active configuration is
//! process-wide; containers read it when they are created.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::{self, LogConfig};

static ACTIVE: Lazy<RwLock<RuntimeConfig>> = Lazy::new(|| RwLock::new(RuntimeConfig::default()));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub dict: DictConfig,

    #[serde(default)]
    pub log: LogSection,
}

/// Growth policy of `UDict` slot arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictConfig {
    /// Slot count of the first allocation; a power of two
    #[serde(default = "default_min_capacity")]
    pub min_capacity: usize,

    /// Rehash before `size` would exceed this percentage of capacity
    #[serde(default = "default_max_load_percent")]
    pub max_load_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSection {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub spans: bool,
}

fn default_min_capacity() -> usize {
    8
}

fn default_max_load_percent() -> u8 {
    75
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for DictConfig {
    fn default() -> Self {
        Self {
            min_capacity: default_min_capacity(),
            max_load_percent: default_max_load_percent(),
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
            json: false,
            spans: false,
        }
    }
}

impl DictConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_capacity == 0 || !self.min_capacity.is_power_of_two() {
            return Err(Error::Config(format!(
                "dict.min_capacity must be a non-zero power of two, got {}",
                self.min_capacity
            )));
        }
        if !(1..=95).contains(&self.max_load_percent) {
            return Err(Error::Config(format!(
                "dict.max_load_percent must be in 1..=95, got {}",
                self.max_load_percent
            )));
        }
        Ok(())
    }
}

impl LogSection {
    /// Translate into a logging setup; unknown level names are rejected
    pub fn to_log_config(&self) -> Result<LogConfig> {
        let level = logging::parse_level(&self.level)
            .ok_or_else(|| Error::Config(format!("unknown log level `{}`", self.level)))?;

        Ok(LogConfig {
            level,
            log_path: self.file.clone(),
            json_format: self.json,
            show_spans: self.spans,
        })
    }
}

impl RuntimeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RuntimeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `ANYRT_DICT_*` and `ANYRT_LOG_*` variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("ANYRT_DICT_MIN_CAPACITY") {
            config.dict.min_capacity = value.trim().parse().map_err(|_| {
                Error::Config(format!("ANYRT_DICT_MIN_CAPACITY: invalid number `{}`", value))
            })?;
        }

        if let Ok(value) = std::env::var("ANYRT_DICT_MAX_LOAD") {
            config.dict.max_load_percent = value.trim().parse().map_err(|_| {
                Error::Config(format!("ANYRT_DICT_MAX_LOAD: invalid percentage `{}`", value))
            })?;
        }

        let log = LogConfig::from_env();
        config.log = LogSection {
            level: log.level.as_str().to_lowercase(),
            file: log.log_path,
            json: log.json_format,
            spans: log.show_spans,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.dict.validate()?;
        self.log.to_log_config().map(|_| ())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Make `config` the process-wide configuration after validating it
pub fn install(config: RuntimeConfig) -> Result<()> {
    config.validate()?;
    *ACTIVE.write() = config;
    Ok(())
}

/// Snapshot of the active configuration
pub fn current() -> RuntimeConfig {
    ACTIVE.read().clone()
}

/// Restore the built-in defaults
pub fn reset() {
    *ACTIVE.write() = RuntimeConfig::default();
}
