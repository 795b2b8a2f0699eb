//! Event bus error types.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, ValidationError};

/// Errors surfaced by the event bus client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("Invalid broker URL '{url}': {reason}")]
    InvalidBrokerUrl { url: String, reason: String },

    /// The transport could not be opened at all.
    #[error("Failed to connect to broker: {0}")]
    ConnectFailed(String),

    #[error("Event bus is not connected")]
    NotConnected,

    #[error("Publish to '{topic}' failed: {reason}")]
    PublishFailed { topic: String, reason: String },

    /// Reconnection gave up after the configured number of attempts.
    #[error("Broker unreachable after {attempts} reconnect attempts")]
    BrokerUnreachable { attempts: u32 },

    #[error("Could not decode payload on '{topic}': {reason}")]
    Decode { topic: String, reason: String },

    #[error("Invalid device: {0}")]
    InvalidDevice(#[from] ValidationError),
}

impl BusError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BusError::InvalidBrokerUrl { .. } | BusError::InvalidDevice(_) => {
                ErrorCode::ValidationFailed
            }
            BusError::ConnectFailed(_) => ErrorCode::BrokerConnectFailed,
            BusError::NotConnected => ErrorCode::NotConnected,
            BusError::PublishFailed { .. } => ErrorCode::PublishFailed,
            BusError::BrokerUnreachable { .. } => ErrorCode::BrokerUnreachable,
            BusError::Decode { .. } => ErrorCode::DecodeFailed,
        }
    }
}
