//! Configuration management for drivecontrol.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "drivecontrol";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "drivecontrol.db";

/// Environment variable prefix.
const ENV_PREFIX: &str = "DRIVECONTROL_";

/// Lowest and highest cost accepted by bcrypt.
const HASH_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `DRIVECONTROL_`, sections separated
///    by a double underscore, e.g. `DRIVECONTROL_INSIGHT__API_KEY`)
/// 2. TOML config file at `~/.config/drivecontrol/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Account directory configuration.
    pub accounts: AccountsConfig,
    /// Insight service configuration.
    pub insight: InsightConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/drivecontrol/drivecontrol.db`
    pub database_path: Option<PathBuf>,
}

/// Account-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// Refuse to register accounts without a password.
    pub require_password: bool,
    /// bcrypt work factor used when hashing new passwords.
    pub hash_cost: u32,
}

/// Insight service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Whether insight requests are made at all.
    pub enabled: bool,
    /// API key for the text-generation service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name passed to the service.
    pub model: String,
    /// Base URL of the service API.
    pub base_url: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            require_password: false,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.7,
            max_output_tokens: 300,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from defaults, the config file and the
    /// environment. `None` reads the default config file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !HASH_COST_RANGE.contains(&self.accounts.hash_cost) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "hash_cost ({}) must be between {} and {}",
                    self.accounts.hash_cost,
                    HASH_COST_RANGE.start(),
                    HASH_COST_RANGE.end()
                ),
            });
        }

        let insight = &self.insight;
        if !(0.0..=2.0).contains(&insight.temperature) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "temperature ({}) must be between 0.0 and 2.0",
                    insight.temperature
                ),
            });
        }

        if insight.max_output_tokens == 0 {
            return Err(Error::ConfigValidation {
                message: "max_output_tokens must be greater than 0".to_string(),
            });
        }

        if insight.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "timeout_secs must be greater than 0".to_string(),
            });
        }

        if insight.model.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "insight model must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

impl InsightConfig {
    /// Request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
