//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (QUIRE_*)
//! 2. TOML config file (if QUIRE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (QUIRE_*)
/// 2. TOML config file (if QUIRE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    ///
    /// Set via QUIRE_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Public base URL used in feeds and emails.
    ///
    /// Set via QUIRE_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Root of the content tree (`posts/`, `private/`, `pages/`, `projects/`).
    ///
    /// Set via QUIRE_CONTENT_DIR environment variable.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Path to the SQLite database.
    ///
    /// Set via QUIRE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Feed and email title.
    #[serde(default = "default_site_title")]
    pub site_title: String,

    /// Feed description.
    #[serde(default)]
    pub site_description: String,

    /// Shared secret for the deploy webhook. Unset disables the webhook.
    ///
    /// Set via QUIRE_DEPLOY_WEBHOOK_SECRET environment variable.
    #[serde(default)]
    pub deploy_webhook_secret: Option<String>,

    /// Bearer token for the admin API. Unset disables the admin API.
    ///
    /// Set via QUIRE_ADMIN_API_KEY environment variable.
    #[serde(default)]
    pub admin_api_key: Option<String>,

    #[serde(default)]
    pub smtp_host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    /// Sender address for subscriber mail.
    #[serde(default)]
    pub from_email: Option<String>,

    /// Requests allowed per client within one window.
    #[serde(default = "default_rate_limit_capacity")]
    pub rate_limit_capacity: usize,

    /// Rate limiter window in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Maximum webhook body size read before signature verification.
    #[serde(default = "default_webhook_max_bytes")]
    pub webhook_max_bytes: usize,

    /// Upper bound on reading the webhook body.
    #[serde(default = "default_webhook_read_timeout_secs")]
    pub webhook_read_timeout_secs: u64,

    /// Upper bound on the source pull step of a webhook reload.
    #[serde(default = "default_pull_timeout_secs")]
    pub pull_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".into()
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/quire.sqlite")
}

fn default_site_title() -> String {
    "quire".into()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_rate_limit_capacity() -> usize {
    5
}

fn default_rate_limit_window_secs() -> u64 {
    3600
}

fn default_webhook_max_bytes() -> usize {
    1_048_576 // 1MB
}

fn default_webhook_read_timeout_secs() -> u64 {
    10
}

fn default_pull_timeout_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            base_url: default_base_url(),
            content_dir: default_content_dir(),
            db_path: default_db_path(),
            site_title: default_site_title(),
            site_description: String::new(),
            deploy_webhook_secret: None,
            admin_api_key: None,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from_email: None,
            rate_limit_capacity: default_rate_limit_capacity(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            webhook_max_bytes: default_webhook_max_bytes(),
            webhook_read_timeout_secs: default_webhook_read_timeout_secs(),
            pull_timeout_secs: default_pull_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Rate limiter window as Duration.
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn webhook_read_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_read_timeout_secs)
    }

    /// Pull timeout as Duration for use with tokio.
    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }

    /// Parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `bind_addr` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid { field: "bind_addr".into(), reason: e.to_string() })
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Whether enough SMTP settings are present to send mail.
    pub fn smtp_configured(&self) -> bool {
        self.smtp_host.as_deref().is_some_and(|h| !h.is_empty())
            && self.from_email.as_deref().is_some_and(|f| !f.is_empty())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `QUIRE_`
    /// 2. TOML file from `QUIRE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("QUIRE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("QUIRE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Admin API key, if the admin API is enabled.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is unset or empty.
    pub fn require_admin_api_key(&self) -> Result<&str, ConfigError> {
        self.admin_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "admin_api_key".into(),
                hint: "Set QUIRE_ADMIN_API_KEY environment variable".into(),
            })
    }

    /// Deploy webhook secret, if the webhook is enabled.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the secret is unset or empty.
    pub fn require_webhook_secret(&self) -> Result<&str, ConfigError> {
        self.deploy_webhook_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "deploy_webhook_secret".into(),
                hint: "Set QUIRE_DEPLOY_WEBHOOK_SECRET environment variable".into(),
            })
    }
}
