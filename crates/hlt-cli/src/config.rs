//! Application configuration.
//!
//! Operational settings only. Which network the demo talks to is decided by
//! the environment guard, never by this file.

use crate::error::{AppError, AppResult};
use hlt_dashboard::DashboardConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Live subscription settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSettings {
    /// How long `subs` listens before unsubscribing.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

fn default_window_secs() -> u64 {
    30
}

fn default_ping_interval_secs() -> u64 {
    30
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    300
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub subscription: SubscriptionSettings,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub http: HttpSettings,
}

impl AppConfig {
    /// Load configuration from file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject durations the runtime cannot use.
    pub fn validate(&self) -> AppResult<()> {
        let periods = [
            ("subscription.window_secs", self.subscription.window_secs),
            ("subscription.ping_interval_secs", self.subscription.ping_interval_secs),
            ("polling.interval_secs", self.polling.interval_secs),
            ("http.timeout_secs", self.http.timeout_secs),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(AppError::Config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }

    /// Load `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            info!(config_path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.subscription.window_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.subscription.ping_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}
