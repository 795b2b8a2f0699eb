//! Mock backend probe and reachability signal for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{BackendProbe, NetworkReachability, ProbeError};

/// Mock backend probe.
///
/// Availability answers are consumed in order; once the queue is empty
/// every check returns `default_available`.
#[derive(Debug, Clone)]
pub struct MockBackendProbe {
    endpoint: String,
    health: Arc<Mutex<Result<(), ProbeError>>>,
    health_delay: Duration,
    availability: Arc<Mutex<VecDeque<Result<bool, ProbeError>>>>,
    default_available: bool,
    availability_delay: Duration,
    availability_checks: Arc<AtomicUsize>,
}

impl Default for MockBackendProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackendProbe {
    /// Healthy backend whose streams are immediately available.
    pub fn new() -> Self {
        Self {
            endpoint: "https://backend.test/health".to_string(),
            health: Arc::new(Mutex::new(Ok(()))),
            health_delay: Duration::ZERO,
            availability: Arc::new(Mutex::new(VecDeque::new())),
            default_available: true,
            availability_delay: Duration::ZERO,
            availability_checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_health_error(self, error: ProbeError) -> Self {
        *self.health.lock().unwrap() = Err(error);
        self
    }

    /// Makes the health check hang for `delay`.
    pub fn with_health_delay(mut self, delay: Duration) -> Self {
        self.health_delay = delay;
        self
    }

    /// Queues one availability answer.
    pub fn with_availability(self, answer: Result<bool, ProbeError>) -> Self {
        self.availability.lock().unwrap().push_back(answer);
        self
    }

    /// Answer once the queue is drained.
    pub fn with_default_available(mut self, available: bool) -> Self {
        self.default_available = available;
        self
    }

    pub fn with_availability_delay(mut self, delay: Duration) -> Self {
        self.availability_delay = delay;
        self
    }

    pub fn availability_checks(&self) -> usize {
        self.availability_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendProbe for MockBackendProbe {
    fn health_endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn check_health(&self) -> Result<(), ProbeError> {
        if !self.health_delay.is_zero() {
            sleep(self.health_delay).await;
        }
        self.health.lock().unwrap().clone()
    }

    async fn stream_available(&self, _stream_url: &str) -> Result<bool, ProbeError> {
        self.availability_checks.fetch_add(1, Ordering::SeqCst);
        if !self.availability_delay.is_zero() {
            sleep(self.availability_delay).await;
        }
        self.availability
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(self.default_available))
    }
}

/// Switchable network reachability signal.
#[derive(Debug, Clone)]
pub struct MockReachability {
    reachable: Arc<AtomicBool>,
}

impl MockReachability {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: Arc::new(AtomicBool::new(reachable)),
        }
    }

    pub fn set(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl NetworkReachability for MockReachability {
    async fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn availability_queue_then_default() {
        let probe = MockBackendProbe::new()
            .with_availability(Ok(false))
            .with_availability(Err(ProbeError::Timeout))
            .with_default_available(true);

        assert_eq!(probe.stream_available("u").await, Ok(false));
        assert_eq!(probe.stream_available("u").await, Err(ProbeError::Timeout));
        assert_eq!(probe.stream_available("u").await, Ok(true));
        assert_eq!(probe.availability_checks(), 3);
    }

    #[tokio::test]
    async fn reachability_is_switchable() {
        let signal = MockReachability::new(true);
        assert!(signal.is_reachable().await);
        signal.set(false);
        assert!(!signal.is_reachable().await);
    }
}
