//! Configuration file support for Carebloom.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/carebloom/config.toml`.

use crate::template::ConfiguredTemplates;
use crate::types::EventArchetype;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Daily routines per patient id, overriding the built-in ones
    #[serde(default)]
    pub templates: HashMap<String, Vec<EventArchetype>>,
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

/// Which backend deployment to talk to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Remote calendar store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub environment: Environment,

    #[serde(default = "default_development_url")]
    pub development_url: String,

    #[serde(default = "default_production_url")]
    pub production_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: default_remote_enabled(),
            environment: Environment::default(),
            development_url: default_development_url(),
            production_url: default_production_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    /// Base URL for the selected environment
    pub fn base_url(&self) -> &str {
        match self.environment {
            Environment::Development => &self.development_url,
            Environment::Production => &self.production_url,
        }
    }
}

/// Calendar behaviour
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_patient")]
    pub default_patient: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            default_patient: default_patient(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("carebloom")
}

fn default_remote_enabled() -> bool {
    true
}

fn default_development_url() -> String {
    "http://localhost:8000".into()
}

fn default_production_url() -> String {
    "https://api.mindbloom.care".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_patient() -> String {
    "1".into()
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

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("carebloom").join("config.toml")
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.remote.timeout_secs == 0 {
            return Err(Error::Config("remote.timeout_secs must be positive".into()));
        }
        if self.remote.base_url().trim().is_empty() {
            return Err(Error::Config(format!(
                "no URL configured for {:?} environment",
                self.remote.environment
            )));
        }
        if self.calendar.default_patient.trim().is_empty() {
            return Err(Error::Config("calendar.default_patient must not be empty".into()));
        }
        self.template_provider()?;
        Ok(())
    }

    /// Template provider built from the `[templates]` section
    pub fn template_provider(&self) -> Result<ConfiguredTemplates> {
        ConfiguredTemplates::new(&self.templates)
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
