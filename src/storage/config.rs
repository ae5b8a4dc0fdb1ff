//! Configuration management
//!
//! Settings are resolved once at startup and stay read-only afterwards.
//! Priority: CLI argument > environment (including `.env`) > config.toml

use super::Result;
use crate::api::client::DEFAULT_TIMEOUT_SECS;
use crate::error::{ConfigError, StorageError};
use crate::utils::validation::validate_url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use zeroize::Zeroizing;

pub const APP_DIR_NAME: &str = "langconnect-cli";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_API_URL: &str = "LANGCONNECT_API_URL";
pub const ENV_API_KEY: &str = "LANGCONNECT_API_KEY";
pub const ENV_ADMIN_EMAIL: &str = "LANGCONNECT_ADMIN_EMAIL";
pub const ENV_ADMIN_PASSWORD: &str = "LANGCONNECT_ADMIN_PASSWORD";

/// On-disk configuration file
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// LangConnect API base URL
    pub url: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: Option<u64>,
    /// Default account email for sign in
    pub email: Option<String>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => default_config_dir()?.join(CONFIG_FILE_NAME),
        };

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|e| StorageError::ConfigParseError {
                message: format!("Failed to parse config file: {}", e),
            })?;

        Ok(config)
    }
}

/// Directory holding config.toml and the credential cache
pub fn default_config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or(StorageError::ConfigDirNotFound)?;
    Ok(home_dir.join(".config").join(APP_DIR_NAME))
}

/// A password that is wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Admin account used for implicit sign in
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: Secret,
}

/// Resolved, immutable settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<Secret>,
    pub timeout: Duration,
}

impl Settings {
    /// Merge CLI values, environment and the config file.
    ///
    /// `env` is the variable lookup; production passes `std::env::var`.
    pub fn resolve<F>(file: &Config, api_url: Option<String>, api_key: Option<String>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let base_url = non_empty(api_url)
            .or_else(|| non_empty(env(ENV_API_URL)))
            .or_else(|| non_empty(file.url.clone()))
            .map(|url| url.trim_end_matches('/').to_string());

        Self {
            base_url,
            api_key: non_empty(api_key).or_else(|| non_empty(env(ENV_API_KEY))),
            admin_email: non_empty(env(ENV_ADMIN_EMAIL)).or_else(|| non_empty(file.email.clone())),
            admin_password: non_empty(env(ENV_ADMIN_PASSWORD)).map(Secret::new),
            timeout: Duration::from_secs(file.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// The base URL is required for every command that talks to the API.
    pub fn require_base_url(&self) -> std::result::Result<&str, ConfigError> {
        let url = self
            .base_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField {
                field: "base_url".to_string(),
                hint: format!(
                    "Set {} (environment or .env), pass --api-url, or add `url` to {}",
                    ENV_API_URL, CONFIG_FILE_NAME
                ),
            })?;

        validate_url(url).map_err(|_| ConfigError::InvalidValue {
            field: "base_url".to_string(),
            value: url.to_string(),
            reason: "URL must start with http:// or https://".to_string(),
        })?;

        Ok(url)
    }

    pub fn admin_credentials(&self) -> Option<AdminCredentials> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some(AdminCredentials {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}
