//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use crate::infrastructure::notifications::{BackoffPolicy, STREAM_PATH};

pub(super) const APP_NAME: &str = "stockwire";
pub(super) const APP_QUALIFIER: &str = "com";
pub(super) const APP_ORGANIZATION: &str = "stockwire";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Backend API configuration.
    #[serde(default)]
    pub api: ApiConfig,

    /// Notification stream configuration.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
}

impl ApiConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            login_path: default_login_path(),
            refresh_path: default_refresh_path(),
        }
    }
}

/// Notification stream configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Connect to the notification stream at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_stream_path")]
    pub stream_path: String,

    /// First reconnect delay in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Reconnect delay ceiling in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Factor applied to the delay after each failed attempt.
    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,

    /// Consecutive failures before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

impl NotificationsConfig {
    /// Reconnect policy for the stream client.
    #[must_use]
    pub fn backoff_policy(&self) -> BackoffPolicy {
        let max_delay = Duration::from_millis(self.max_delay_ms);
        BackoffPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms).min(max_delay),
            max_delay,
            growth_factor: if self.growth_factor.is_finite() && self.growth_factor >= 1.0 {
                self.growth_factor
            } else {
                default_growth_factor()
            },
            max_attempts: self.max_reconnect_attempts.max(1),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stream_path: default_stream_path(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            growth_factor: default_growth_factor(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_login_path() -> String {
    "/api/v1/auth/login".to_string()
}

fn default_refresh_path() -> String {
    "/api/v1/auth/refresh".to_string()
}

fn default_stream_path() -> String {
    STREAM_PATH.to_string()
}

fn default_base_delay_ms() -> u64 {
    3_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_growth_factor() -> f64 {
    1.5
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(base_url) = &args.base_url {
            self.api.base_url.clone_from(base_url);
        }
        if let Some(timeout_secs) = args.timeout_secs {
            self.api.timeout_secs = timeout_secs;
        }
        if let Some(enabled) = args.notifications {
            self.notifications.enabled = enabled;
        }
        if let Some(attempts) = args.max_reconnect_attempts {
            self.notifications.max_reconnect_attempts = attempts;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("stockwire.log"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            api: ApiConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}
