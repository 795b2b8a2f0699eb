//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number for {0}")]
    InvalidPort(&'static str),

    #[error("Invalid duration for {0}")]
    InvalidTimeout(&'static str),

    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),

    #[error("Invalid relay base URL format")]
    InvalidRelayUrl,

    #[error("Invalid speed test URL format")]
    InvalidSpeedTestUrl,

    #[error("Relay attempts must be at least 1")]
    InvalidRelayAttempts,

    #[error("Poll interval must not exceed poll deadline")]
    PollIntervalTooLong,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
