//! Client configuration loaded from the environment.

use std::time::Duration;

use crate::poller::{PollConfig, DEFAULT_POLL_INTERVAL};

/// Default base URL of a locally running Sparsify server.
pub const DEFAULT_API_URL: &str = "http://localhost:5543/api";

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the job service, including the `/api` prefix.
    pub api_url: String,
    /// Delay between two fetches of the same job.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default                     |
    /// |--------------------|-----------------------------|
    /// | `SPARSIFY_API_URL` | `http://localhost:5543/api` |
    /// | `POLL_INTERVAL_MS` | `100`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("SPARSIFY_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);

        let poll_interval = match lookup("POLL_INTERVAL_MS") {
            Some(raw) => {
                let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "POLL_INTERVAL_MS",
                    value: raw.clone(),
                })?;
                Duration::from_millis(ms)
            }
            None => defaults.poll_interval,
        };

        Ok(Self {
            api_url,
            poll_interval,
        })
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: self.poll_interval,
        }
    }
}

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value: '{value}'")]
    Invalid { var: &'static str, value: String },
}
