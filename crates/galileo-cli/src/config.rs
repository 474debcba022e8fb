//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use galileo_core::Timing;
use galileo_types::{EquipmentCatalog, FALLBACK_EQUIPMENT};

use crate::cli::ConfigKey;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Serial port the datalogger cable is attached to
    #[serde(default = "default_port")]
    pub port: String,

    /// Serial baud rate
    #[serde(default = "default_baud")]
    pub baud: u32,

    /// History directory override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_dir: Option<PathBuf>,

    /// Equipment label used when `--equipment` is not given
    #[serde(default = "default_equipment")]
    pub default_equipment: String,

    /// Protocol settle delays
    #[serde(default)]
    pub timing: TimingConfig,

    /// Equipment catalog override; the built-in catalog is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<EquipmentCatalog>,
}

fn default_port() -> String {
    if cfg!(windows) {
        "COM3".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    }
}

fn default_baud() -> u32 {
    9600
}

fn default_equipment() -> String {
    FALLBACK_EQUIPMENT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud: default_baud(),
            history_dir: None,
            default_equipment: default_equipment(),
            timing: TimingConfig::default(),
            equipment: None,
        }
    }
}

/// Protocol timing in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub power_settle_ms: u64,
    pub wake_delay_ms: u64,
    pub header_delay_ms: u64,
    pub block_delay_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            power_settle_ms: 200,
            wake_delay_ms: 100,
            header_delay_ms: 300,
            block_delay_ms: 300,
            read_timeout_ms: 1000,
        }
    }
}

impl TimingConfig {
    pub fn to_timing(self) -> Timing {
        Timing {
            power_settle: Duration::from_millis(self.power_settle_ms),
            wake_settle: Duration::from_millis(self.wake_delay_ms),
            header_settle: Duration::from_millis(self.header_delay_ms),
            block_settle: Duration::from_millis(self.block_delay_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("galileo")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config {}: {}", path.display(), e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Effective history directory.
    pub fn history_dir(&self) -> PathBuf {
        self.history_dir
            .clone()
            .unwrap_or_else(galileo_store::default_history_dir)
    }

    /// Effective equipment catalog.
    pub fn catalog(&self) -> EquipmentCatalog {
        self.equipment.clone().unwrap_or_default()
    }

    pub fn timing(&self) -> Timing {
        self.timing.to_timing()
    }

    /// Apply a `config set` assignment.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            ConfigKey::Port => {
                if value.is_empty() {
                    bail!("Port cannot be empty");
                }
                self.port = value.to_string();
            }
            ConfigKey::Baud => {
                let baud: u32 = value
                    .parse()
                    .with_context(|| format!("'{}' is not a valid baud rate", value))?;
                if baud == 0 {
                    bail!("Baud rate must be greater than zero");
                }
                self.baud = baud;
            }
            ConfigKey::HistoryDir => {
                self.history_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            ConfigKey::DefaultEquipment => {
                if value.is_empty() {
                    bail!("Equipment label cannot be empty");
                }
                self.default_equipment = value.to_string();
            }
        }
        Ok(())
    }
}
