//! Harness-wide configuration loaded from the environment.

use crate::errors::{ContainerError, ContainerResult};
use std::env;
use std::time::Duration;
use test_utils::{DEFAULT_NAME_PREFIX, NAME_PREFIX_ENV, is_valid_name_prefix};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Environment variable holding the default startup timeout in seconds.
pub const STARTUP_TIMEOUT_ENV: &str = "CONTAINERS_STARTUP_TIMEOUT_SECS";

const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings applied to every container the harness starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Startup timeout used when a request does not set its own.
    pub startup_timeout: Duration,

    /// Prefix for generated container names.
    pub name_prefix: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `CONTAINERS_STARTUP_TIMEOUT_SECS`: positive integer, default 60
    /// - `CONTAINERS_NAME_PREFIX`: container name prefix, default `itest`
    pub fn from_env() -> ContainerResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var(STARTUP_TIMEOUT_ENV) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ContainerError::Config {
                    key: STARTUP_TIMEOUT_ENV.to_string(),
                    reason: format!("must be a positive integer, got '{}'", raw),
                })?;
            config.startup_timeout = Duration::from_secs(secs);
        }

        if let Ok(prefix) = env::var(NAME_PREFIX_ENV) {
            if !is_valid_name_prefix(&prefix) {
                return Err(ContainerError::Config {
                    key: NAME_PREFIX_ENV.to_string(),
                    reason: format!(
                        "must start with a letter or digit and contain only [a-zA-Z0-9_.-], got '{}'",
                        prefix
                    ),
                });
            }
            config.name_prefix = prefix;
        }

        Ok(config)
    }
}
