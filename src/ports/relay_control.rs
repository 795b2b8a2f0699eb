//! Relay Control Port - Interface for the remote stream relay.
//!
//! The relay converts a device's native feed into an HLS stream the client
//! can play. The orchestrator starts it before a session goes live and stops
//! it on teardown.
//!
//! # Design
//!
//! - One relay per device, addressed by `DeviceId`
//! - Start responses may already carry the playable URL
//! - `stream_descriptor` is the fallback lookup when they do not
//! - Errors say whether a retry can help

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DeviceId;

/// Port for remote relay lifecycle control.
#[async_trait]
pub trait RelayControl: Send + Sync {
    /// Ask the relay to start streaming a device.
    async fn start_relay(
        &self,
        device_id: &DeviceId,
        options: &RelayOptions,
    ) -> Result<RelayStarted, RelayError>;

    /// Ask the relay to stop streaming a device.
    async fn stop_relay(&self, device_id: &DeviceId) -> Result<(), RelayError>;

    /// Current relay status for a device.
    async fn relay_status(&self, device_id: &DeviceId) -> Result<RelayStatus, RelayError>;

    /// Look up the playable stream URL for a device, if one exists.
    async fn stream_descriptor(&self, device_id: &DeviceId) -> Result<Option<String>, RelayError>;
}

/// Options sent with a start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayOptions {
    /// Requested output format.
    pub format: String,
    /// Whether audio should be relayed.
    pub audio: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            format: "hls".to_string(),
            audio: true,
        }
    }
}

/// Start response. Either field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStarted {
    #[serde(default)]
    pub hls_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RelayStarted {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            hls_url: Some(url.into()),
            message: None,
        }
    }

    /// Start accepted but no URL yet.
    pub fn pending() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStatus {
    pub running: bool,
}

/// Relay errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// The relay answered with a non-success status.
    #[error("relay returned {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Request could not be delivered or timed out.
    #[error("network error: {0}")]
    Network(String),

    /// Bearer token was missing or refused.
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// Response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl RelayError {
    /// Network failures and 5xx responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            RelayError::Network(_) => true,
            RelayError::Rejected { status, .. } => *status >= 500 || *status == 429,
            RelayError::Unauthorized(_) | RelayError::Parse(_) => false,
        }
    }
}
