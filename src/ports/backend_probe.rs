//! Backend Probe Port - Reachability checks against the backend and stream.
//!
//! Used by the orchestrator's preflight (backend health) and availability
//! polling (stream HEAD). Callers apply their own timeouts.

use async_trait::async_trait;

/// Port for backend and stream reachability checks.
#[async_trait]
pub trait BackendProbe: Send + Sync {
    /// The endpoint `check_health` hits, for error messages.
    fn health_endpoint(&self) -> String;

    /// Succeeds when the backend answers its health endpoint with 2xx.
    async fn check_health(&self) -> Result<(), ProbeError>;

    /// True when the stream URL answers with 2xx.
    async fn stream_available(&self, stream_url: &str) -> Result<bool, ProbeError>;
}

/// Device-level network signal consulted before backend checks.
#[async_trait]
pub trait NetworkReachability: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Probe errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("unexpected status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("timed out")]
    Timeout,
}
