//! Device link health configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::HealthMonitorConfig;
use crate::ports::LinkConfig;

/// Device link configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Device address on the local network
    #[serde(default = "default_device_host")]
    pub device_host: String,

    #[serde(default = "default_device_port")]
    pub device_port: u16,

    /// Port for the fallback link; defaults to `device_port`
    pub fallback_port: Option<u16>,

    /// Bound for a single connect attempt in milliseconds
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_ms: u64,

    /// Bound for a connectivity test in milliseconds
    #[serde(default = "default_test_timeout")]
    pub test_timeout_ms: u64,

    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// Speed test endpoint; defaults to the device itself
    pub speed_test_url: Option<String>,
}

impl HealthConfig {
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig::new(self.device_host.clone(), self.device_port)
            .with_auto_reconnect(self.auto_reconnect)
    }

    pub fn monitor_config(&self) -> HealthMonitorConfig {
        HealthMonitorConfig {
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
            test_timeout: Duration::from_millis(self.test_timeout_ms),
        }
    }

    pub fn fallback_port(&self) -> u16 {
        self.fallback_port.unwrap_or(self.device_port)
    }

    pub fn speed_test_url(&self) -> String {
        self.speed_test_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}/", self.device_host, self.device_port))
    }

    /// Validate health configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.device_host.is_empty() {
            return Err(ValidationError::MissingRequired("health.device_host"));
        }
        if self.device_port == 0 {
            return Err(ValidationError::InvalidPort("health.device_port"));
        }
        if self.fallback_port == Some(0) {
            return Err(ValidationError::InvalidPort("health.fallback_port"));
        }
        if self.attempt_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("health.attempt_timeout_ms"));
        }
        if self.test_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("health.test_timeout_ms"));
        }
        if let Some(url) = &self.speed_test_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidSpeedTestUrl);
            }
        }
        Ok(())
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            device_host: default_device_host(),
            device_port: default_device_port(),
            fallback_port: None,
            attempt_timeout_ms: default_attempt_timeout(),
            test_timeout_ms: default_test_timeout(),
            auto_reconnect: default_auto_reconnect(),
            speed_test_url: None,
        }
    }
}

fn default_device_host() -> String {
    "192.168.4.1".to_string()
}

fn default_device_port() -> u16 {
    80
}

fn default_attempt_timeout() -> u64 {
    10_000
}

fn default_test_timeout() -> u64 {
    15_000
}

fn default_auto_reconnect() -> bool {
    true
}
