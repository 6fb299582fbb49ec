//! Configuration file support for Rebound.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/rebound/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub booking: BookingConfig,

    #[serde(default)]
    pub studio: StudioConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Defaults applied to newly created schedules
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookingConfig {
    #[serde(default = "default_opens_days_before")]
    pub opens_days_before: u32,

    #[serde(default = "default_closes_hours_before")]
    pub closes_hours_before: u32,

    #[serde(default = "default_capacity")]
    pub default_capacity: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            opens_days_before: default_opens_days_before(),
            closes_hours_before: default_closes_hours_before(),
            default_capacity: default_capacity(),
        }
    }
}

/// Studio identity configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudioConfig {
    #[serde(default = "default_location")]
    pub location: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME")
            .expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("rebound")
}

fn default_opens_days_before() -> u32 {
    14
}

fn default_closes_hours_before() -> u32 {
    2
}

fn default_capacity() -> u32 {
    15
}

fn default_location() -> String {
    "Deinze Kouter 93".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("rebound").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
