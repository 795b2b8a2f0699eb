//! Error types shared across the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
///
/// Every component error maps onto one of these so callers (and log
/// pipelines) can branch on a stable identifier instead of message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidStateTransition,

    // Session errors
    PreflightFailed,
    RelayStartFailed,
    StreamResolutionFailed,
    AvailabilityUnconfirmed,
    SessionBusy,
    Cancelled,

    // Event bus errors
    BrokerConnectFailed,
    BrokerUnreachable,
    NotConnected,
    PublishFailed,
    DecodeFailed,

    // Link health errors
    LinkUnavailable,
    ConnectivityTestFailed,
    AutoReconnectDisabled,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::PreflightFailed => "PREFLIGHT_FAILED",
            ErrorCode::RelayStartFailed => "RELAY_START_FAILED",
            ErrorCode::StreamResolutionFailed => "STREAM_RESOLUTION_FAILED",
            ErrorCode::AvailabilityUnconfirmed => "AVAILABILITY_UNCONFIRMED",
            ErrorCode::SessionBusy => "SESSION_BUSY",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::BrokerConnectFailed => "BROKER_CONNECT_FAILED",
            ErrorCode::BrokerUnreachable => "BROKER_UNREACHABLE",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::PublishFailed => "PUBLISH_FAILED",
            ErrorCode::DecodeFailed => "DECODE_FAILED",
            ErrorCode::LinkUnavailable => "LINK_UNAVAILABLE",
            ErrorCode::ConnectivityTestFailed => "CONNECTIVITY_TEST_FAILED",
            ErrorCode::AutoReconnectDisabled => "AUTO_RECONNECT_DISABLED",
        };
        write!(f, "{}", s)
    }
}
