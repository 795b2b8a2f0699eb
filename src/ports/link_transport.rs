//! Link Transport Port - Physical links to the device.
//!
//! The health monitor holds a primary and a fallback transport and tries
//! them in order. Each transport makes a single attempt per call; retry and
//! timeout policy belong to the caller.

use async_trait::async_trait;

use crate::domain::health::{ConnectionType, SpeedTestResult};

/// Where and how to reach the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub host: String,
    pub port: u16,
    /// Allows `auto_reconnect` to re-run setup with this config.
    pub auto_reconnect: bool,
}

impl LinkConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            auto_reconnect: false,
        }
    }

    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }
}

/// Port for a single physical link.
#[async_trait]
pub trait LinkTransport: Send + Sync {
    /// Which link this transport drives.
    fn kind(&self) -> ConnectionType;

    /// One connection attempt.
    async fn connect(&self, config: &LinkConfig) -> Result<(), TransportError>;
}

/// Port for the round-trip speed probe.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn round_trip(&self) -> Result<SpeedTestResult, super::ProbeError>;
}

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("link unavailable: {0}")]
    Unavailable(String),

    #[error("connect failed: {0}")]
    ConnectFailed(String),
}
