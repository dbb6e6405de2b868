//! Configuration file support for Ember.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/ember/config.toml`.

use crate::{Error, Motivation, Pace, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub plan: PlanConfig,
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

/// Defaults offered when starting a reduction plan
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(default = "default_pace")]
    pub default_pace: Pace,

    #[serde(default = "default_starting_cigarettes")]
    pub default_starting_cigarettes: u32,

    #[serde(default = "default_motivation")]
    pub default_motivation: Motivation,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            default_pace: default_pace(),
            default_starting_cigarettes: default_starting_cigarettes(),
            default_motivation: default_motivation(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("ember")
}

fn default_pace() -> Pace {
    Pace::Moderate
}

fn default_starting_cigarettes() -> u32 {
    10
}

fn default_motivation() -> Motivation {
    Motivation::Health
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
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the plan engine would refuse
    pub fn validate(&self) -> Result<()> {
        let n = self.plan.default_starting_cigarettes;
        if !(crate::plan::MIN_STARTING_CIGARETTES..=crate::plan::MAX_STARTING_CIGARETTES)
            .contains(&n)
        {
            return Err(Error::Config(format!(
                "plan.default_starting_cigarettes must be between {} and {}, got {}",
                crate::plan::MIN_STARTING_CIGARETTES,
                crate::plan::MAX_STARTING_CIGARETTES,
                n
            )));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("ember").join("config.toml")
    }

    /// Directory holding the key-value documents
    pub fn store_dir(&self) -> PathBuf {
        self.data.data_dir.join("store")
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
