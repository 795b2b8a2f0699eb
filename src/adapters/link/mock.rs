//! Mock link transport and speed probe for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::health::{ConnectionType, SpeedTestResult};
use crate::ports::{LinkConfig, LinkProbe, LinkTransport, ProbeError, TransportError};

/// Mock transport that succeeds or fails on demand.
#[derive(Debug, Clone)]
pub struct MockLinkTransport {
    kind: ConnectionType,
    outcome: Arc<Mutex<Result<(), TransportError>>>,
    delay: Duration,
    attempts: Arc<AtomicUsize>,
}

impl MockLinkTransport {
    /// A transport whose connect succeeds.
    pub fn up(kind: ConnectionType) -> Self {
        Self {
            kind,
            outcome: Arc::new(Mutex::new(Ok(()))),
            delay: Duration::ZERO,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A transport whose connect fails with `reason`.
    pub fn down(kind: ConnectionType, reason: impl Into<String>) -> Self {
        let transport = Self::up(kind);
        transport.set_outcome(Err(TransportError::Unavailable(reason.into())));
        transport
    }

    /// Makes each attempt take `delay` before resolving.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_outcome(&self, outcome: Result<(), TransportError>) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkTransport for MockLinkTransport {
    fn kind(&self) -> ConnectionType {
        self.kind
    }

    async fn connect(&self, _config: &LinkConfig) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.outcome.lock().unwrap().clone()
    }
}

/// Mock speed probe.
#[derive(Debug, Clone)]
pub struct MockLinkProbe {
    outcome: Result<SpeedTestResult, ProbeError>,
    delay: Duration,
}

impl MockLinkProbe {
    pub fn new(result: SpeedTestResult) -> Self {
        Self {
            outcome: Ok(result),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(error: ProbeError) -> Self {
        Self {
            outcome: Err(error),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for MockLinkProbe {
    fn default() -> Self {
        Self::new(SpeedTestResult {
            ping_ms: 20,
            download_mbps: 50.0,
            upload_mbps: 10.0,
        })
    }
}

#[async_trait]
impl LinkProbe for MockLinkProbe {
    async fn round_trip(&self) -> Result<SpeedTestResult, ProbeError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}
