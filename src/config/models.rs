// src/config/models.rs
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_REGISTRY_FILE: &str = ".server_check.json";

/// Process-wide settings after all layers have been merged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub timeout_secs: u64,
    pub registry_path: PathBuf,
    #[serde(default = "default_color")]
    pub color: bool,
}

/// Command-line values that take precedence over defaults and environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub timeout_secs: Option<u64>,
    pub registry_path: Option<PathBuf>,
    pub color: Option<bool>,
}

/// Settings for one health-check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckConfig {
    pub timeout: Duration,
}

/// Settings for the registry file store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

fn default_color() -> bool {
    true
}

/// `$HOME/.server_check.json`, or the working directory when no home is known.
pub fn default_registry_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_REGISTRY_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTRY_FILE))
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        if self.registry_path.as_os_str().is_empty() {
            return Err(SettingsError::Invalid(
                "registry path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn check_config(&self) -> CheckConfig {
        CheckConfig {
            timeout: self.timeout(),
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            path: self.registry_path.clone(),
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
