//! Link health error types.

use thiserror::Error;

use crate::domain::foundation::ErrorCode;

/// Errors surfaced by the connection health monitor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthError {
    /// Neither the primary nor the fallback transport could connect.
    #[error("No transport could reach the device: {reasons}")]
    ConnectionFailed { reasons: String },

    /// The round-trip probe failed or timed out.
    #[error("Connectivity test failed: {0}")]
    ConnectivityTestFailed(String),

    /// `auto_reconnect` was called without an opt-in configuration.
    #[error("Auto-reconnect is not enabled for the current link configuration")]
    AutoReconnectDisabled,
}

impl HealthError {
    pub fn code(&self) -> ErrorCode {
        match self {
            HealthError::ConnectionFailed { .. } => ErrorCode::LinkUnavailable,
            HealthError::ConnectivityTestFailed(_) => ErrorCode::ConnectivityTestFailed,
            HealthError::AutoReconnectDisabled => ErrorCode::AutoReconnectDisabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_failed_lists_reasons() {
        let err = HealthError::ConnectionFailed {
            reasons: "wifi: timeout; bluetooth: unsupported".to_string(),
        };
        assert!(err.to_string().contains("wifi: timeout"));
        assert_eq!(err.code(), ErrorCode::LinkUnavailable);
    }
}
