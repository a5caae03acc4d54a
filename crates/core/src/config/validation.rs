//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `bind_addr` is not a socket address
    /// - `base_url` is empty
    /// - `rate_limit_capacity` or `rate_limit_window_secs` is 0
    /// - `webhook_max_bytes` is 0 or exceeds 10MB
    /// - `pull_timeout_secs` is outside 1..=600
    /// - `webhook_read_timeout_secs` is outside 1..=60
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "base_url".into(), reason: "must not be empty".into() });
        }

        if self.rate_limit_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "rate_limit_capacity".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.rate_limit_window_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "rate_limit_window_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.webhook_max_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "webhook_max_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.webhook_max_bytes > 10 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "webhook_max_bytes".into(), reason: "must not exceed 10MB".into() });
        }

        if !(1..=600).contains(&self.pull_timeout_secs) {
            return Err(ConfigError::Invalid {
                field: "pull_timeout_secs".into(),
                reason: "must be between 1 and 600 seconds".into(),
            });
        }

        if !(1..=60).contains(&self.webhook_read_timeout_secs) {
            return Err(ConfigError::Invalid {
                field: "webhook_read_timeout_secs".into(),
                reason: "must be between 1 and 60 seconds".into(),
            });
        }

        if self.smtp_host.is_some() && self.from_email.is_none() {
            tracing::warn!("smtp_host is set without from_email; subscriber mail stays disabled");
        }

        Ok(())
    }
}
