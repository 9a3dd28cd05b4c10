//! Driver configuration
//!
//! Read from TOML; a missing file means defaults. Values can be overridden
//! on the command line. The driver never writes the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rhino_ffb::ConnectionConfig;
use rhino_transport::device_registry::{RHINO_PID, VENDOR_ID};
use rhino_transport::DeviceSelector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Which device to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub vendor_id: u16,
    /// 0 = any product of the vendor
    pub product_id: u16,
    pub serial: Option<String>,
    /// OS device path, takes precedence over enumeration order
    pub path: Option<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: VENDOR_ID,
            product_id: RHINO_PID,
            serial: None,
            path: None,
        }
    }
}

/// Poll loop timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_us: u64,
    pub reconnect_delay_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_us: 1000,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Effect lifecycle defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Idle time before a stopped effect frees its slot
    pub destroy_after_ms: u64,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            destroy_after_ms: 10_000,
        }
    }
}

/// Complete driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub log_level: String,
    pub device: DeviceConfig,
    pub poll: PollConfig,
    pub effects: EffectsConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            device: DeviceConfig::default(),
            poll: PollConfig::default(),
            effects: EffectsConfig::default(),
        }
    }
}

impl DriverConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rhino-ffb")
            .join("driver.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn selector(&self) -> DeviceSelector {
        let mut selector = DeviceSelector::new(self.device.vendor_id, self.device.product_id);
        if let Some(serial) = &self.device.serial {
            selector = selector.with_serial(serial.clone());
        }
        if let Some(path) = &self.device.path {
            selector = selector.with_path(path.clone());
        }
        selector
    }

    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            poll_interval: Duration::from_micros(self.poll.interval_us.max(1)),
            reconnect_delay: Duration::from_millis(self.poll.reconnect_delay_ms),
        }
    }

    pub fn destroy_after(&self) -> Duration {
        Duration::from_millis(self.effects.destroy_after_ms)
    }
}
