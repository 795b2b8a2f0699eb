//! Live session startup configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::SessionConfig as SessionTiming;
use crate::domain::session::AvailabilityPolicy;

/// Startup protocol tuning
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Total relay start calls, including the first
    #[serde(default = "default_relay_attempts")]
    pub relay_attempts: u32,

    #[serde(default = "default_relay_retry_delay")]
    pub relay_retry_delay_ms: u64,

    /// Bound for each health probe and availability check
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_poll_deadline")]
    pub poll_deadline_secs: u64,

    /// `assume_available` or `require_confirmation`
    #[serde(default)]
    pub availability_policy: AvailabilityPolicy,
}

impl SessionConfig {
    /// Orchestrator settings derived from this section
    pub fn timing(&self) -> SessionTiming {
        SessionTiming {
            relay_attempts: self.relay_attempts,
            relay_retry_delay: Duration::from_millis(self.relay_retry_delay_ms),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_deadline: Duration::from_secs(self.poll_deadline_secs),
            availability_policy: self.availability_policy,
            ..SessionTiming::default()
        }
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.relay_attempts == 0 {
            return Err(ValidationError::InvalidRelayAttempts);
        }
        if self.probe_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("session.probe_timeout_ms"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidTimeout("session.poll_interval_ms"));
        }
        if self.poll_interval_ms > self.poll_deadline_secs * 1000 {
            return Err(ValidationError::PollIntervalTooLong);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            relay_attempts: default_relay_attempts(),
            relay_retry_delay_ms: default_relay_retry_delay(),
            probe_timeout_ms: default_probe_timeout(),
            poll_interval_ms: default_poll_interval(),
            poll_deadline_secs: default_poll_deadline(),
            availability_policy: AvailabilityPolicy::default(),
        }
    }
}

fn default_relay_attempts() -> u32 {
    3
}

fn default_relay_retry_delay() -> u64 {
    1500
}

fn default_probe_timeout() -> u64 {
    5000
}

fn default_poll_interval() -> u64 {
    800
}

fn default_poll_deadline() -> u64 {
    30
}
