//! Application configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::net::api::DEFAULT_API_URL;
use crate::services::auth::{DemoCredentials, DemoLatency};

pub const DEFAULT_AUTH_DELAY_MS: u64 = 1000;
pub const DEFAULT_VALIDATE_DELAY_MS: u64 = 500;
pub const DEFAULT_RESET_DELAY_MS: u64 = 1500;
const STORAGE_FILE_NAME: &str = "storage.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub storage_path: PathBuf,
    pub api_url: String,
    pub demo: DemoCredentials,
    pub latency: DemoLatency,
    pub reset_delay: Duration,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `LAUNCHPAD_STORAGE_PATH`: session store file (platform data dir by default)
    /// - `LAUNCHPAD_API_URL`: REST base URL (jsonplaceholder by default)
    /// - `LAUNCHPAD_AUTH_DELAY_MS`: default 1000
    /// - `LAUNCHPAD_VALIDATE_DELAY_MS`: default 500
    /// - `LAUNCHPAD_RESET_DELAY_MS`: default 1500
    /// - `LAUNCHPAD_DEMO_EMAIL` / `LAUNCHPAD_DEMO_PASSWORD`: demo credential pair
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a set value cannot be used.
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage_path = std::env::var_os("LAUNCHPAD_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_storage_path);

        let api_url = parse_api_url(std::env::var("LAUNCHPAD_API_URL").ok().as_deref())?;

        let defaults = DemoCredentials::default();
        let demo = DemoCredentials {
            email: std::env::var("LAUNCHPAD_DEMO_EMAIL").unwrap_or(defaults.email),
            password: std::env::var("LAUNCHPAD_DEMO_PASSWORD").unwrap_or(defaults.password),
        };

        let latency = DemoLatency {
            request: env_millis("LAUNCHPAD_AUTH_DELAY_MS", DEFAULT_AUTH_DELAY_MS)?,
            validate: env_millis("LAUNCHPAD_VALIDATE_DELAY_MS", DEFAULT_VALIDATE_DELAY_MS)?,
        };
        let reset_delay = env_millis("LAUNCHPAD_RESET_DELAY_MS", DEFAULT_RESET_DELAY_MS)?;

        Ok(Self { storage_path, api_url, demo, latency, reset_delay })
    }

    /// Replace the API base URL, applying the same checks as `LAUNCHPAD_API_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for anything but an http(s) URL.
    pub fn set_api_url(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.api_url = parse_api_url(Some(raw))?;
        Ok(())
    }
}

fn env_millis(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::Invalid { var: key, reason: e.to_string() }),
        Err(_) => Ok(Duration::from_millis(default)),
    }
}

fn parse_api_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let url = raw.unwrap_or(DEFAULT_API_URL).trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::Invalid {
            var: "LAUNCHPAD_API_URL",
            reason: format!("expected an http(s) URL, got '{url}'"),
        });
    }
    Ok(url.to_owned())
}

fn default_storage_path() -> PathBuf {
    directories::ProjectDirs::from("dev", "launchpad", "launchpad").map_or_else(
        || PathBuf::from(".launchpad").join(STORAGE_FILE_NAME),
        |dirs| dirs.data_dir().join(STORAGE_FILE_NAME),
    )
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
