//! Session-specific error types.

use std::time::Duration;

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, ValidationError};

/// Errors returned by the live session orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Network or backend unreachable before any relay action was taken.
    #[error("Cannot reach {endpoint}: {reason}")]
    PreflightFailed { endpoint: String, reason: String },

    /// Every relay start attempt failed.
    #[error("Relay failed to start after {attempts} attempts: {last_error}")]
    RelayStartFailed { attempts: u32, last_error: String },

    /// Neither the relay response nor the stream lookup produced a URL.
    #[error("No stream URL available for device {device_id}")]
    StreamResolutionFailed { device_id: String },

    /// Polling deadline passed without a successful availability check
    /// while confirmation was required.
    #[error("Stream not confirmed available after {waited:?}")]
    AvailabilityUnconfirmed { waited: Duration },

    /// Another `start()` is already running.
    #[error("A session start is already in progress")]
    SessionBusy,

    /// `stop()` interrupted the start.
    #[error("Session start was cancelled")]
    Cancelled,

    #[error("Invalid session transition: {0}")]
    InvalidTransition(String),
}

impl SessionError {
    pub fn preflight(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        SessionError::PreflightFailed {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::PreflightFailed { .. } => ErrorCode::PreflightFailed,
            SessionError::RelayStartFailed { .. } => ErrorCode::RelayStartFailed,
            SessionError::StreamResolutionFailed { .. } => ErrorCode::StreamResolutionFailed,
            SessionError::AvailabilityUnconfirmed { .. } => ErrorCode::AvailabilityUnconfirmed,
            SessionError::SessionBusy => ErrorCode::SessionBusy,
            SessionError::Cancelled => ErrorCode::Cancelled,
            SessionError::InvalidTransition(_) => ErrorCode::InvalidStateTransition,
        }
    }

    /// Fatal errors are written into `SessionState.error`; the rest only
    /// reach the caller.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SessionError::SessionBusy | SessionError::Cancelled)
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::InvalidTransition(err.to_string())
    }
}
