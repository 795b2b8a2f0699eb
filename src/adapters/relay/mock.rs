//! Mock Relay Control for testing.
//!
//! # Features
//!
//! - Queued start outcomes (consumed in order, default success)
//! - Configurable stream descriptor and stop failure
//! - Simulated latency on start and stop
//! - Call tracking with `tokio::time::Instant` stamps, so paused-clock
//!   tests can assert on backoff spacing
//!
//! # Example
//!
//! ```ignore
//! let relay = MockRelayControl::new()
//!     .with_start_error(RelayError::Network("reset".into()))
//!     .with_start(RelayStarted::with_url("https://relay/cam.m3u8"));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::domain::foundation::DeviceId;
use crate::ports::{RelayControl, RelayError, RelayOptions, RelayStarted, RelayStatus};

/// Mock relay control.
#[derive(Debug, Clone, Default)]
pub struct MockRelayControl {
    inner: Arc<Mutex<MockRelayState>>,
    start_delay: Duration,
    stop_delay: Duration,
}

#[derive(Debug, Default)]
struct MockRelayState {
    starts: VecDeque<Result<RelayStarted, RelayError>>,
    descriptor: Option<String>,
    stop_error: Option<RelayError>,
    running: bool,
    start_calls: Vec<Instant>,
    stopped: Vec<DeviceId>,
}

impl MockRelayControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful start response.
    pub fn with_start(self, started: RelayStarted) -> Self {
        self.inner.lock().unwrap().starts.push_back(Ok(started));
        self
    }

    /// Queues a failed start.
    pub fn with_start_error(self, error: RelayError) -> Self {
        self.inner.lock().unwrap().starts.push_back(Err(error));
        self
    }

    /// URL returned by `stream_descriptor`.
    pub fn with_descriptor(self, url: impl Into<String>) -> Self {
        self.inner.lock().unwrap().descriptor = Some(url.into());
        self
    }

    /// Makes every `stop_relay` call fail.
    pub fn with_stop_error(self, error: RelayError) -> Self {
        self.inner.lock().unwrap().stop_error = Some(error);
        self
    }

    /// Simulated latency for each start call.
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Simulated latency for each stop call.
    pub fn with_stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    pub fn start_count(&self) -> usize {
        self.inner.lock().unwrap().start_calls.len()
    }

    /// When each start call arrived.
    pub fn start_times(&self) -> Vec<Instant> {
        self.inner.lock().unwrap().start_calls.clone()
    }

    pub fn stop_count(&self) -> usize {
        self.inner.lock().unwrap().stopped.len()
    }

    /// Devices passed to `stop_relay`, in call order.
    pub fn stopped_devices(&self) -> Vec<DeviceId> {
        self.inner.lock().unwrap().stopped.clone()
    }
}

#[async_trait]
impl RelayControl for MockRelayControl {
    async fn start_relay(
        &self,
        _device_id: &DeviceId,
        _options: &RelayOptions,
    ) -> Result<RelayStarted, RelayError> {
        self.inner.lock().unwrap().start_calls.push(Instant::now());

        if !self.start_delay.is_zero() {
            sleep(self.start_delay).await;
        }

        let mut state = self.inner.lock().unwrap();
        let outcome = state
            .starts
            .pop_front()
            .unwrap_or_else(|| Ok(RelayStarted::with_url("https://relay.test/live/stream.m3u8")));
        if outcome.is_ok() {
            state.running = true;
        }
        outcome
    }

    async fn stop_relay(&self, device_id: &DeviceId) -> Result<(), RelayError> {
        self.inner.lock().unwrap().stopped.push(device_id.clone());

        if !self.stop_delay.is_zero() {
            sleep(self.stop_delay).await;
        }

        let mut state = self.inner.lock().unwrap();
        match state.stop_error.clone() {
            Some(err) => Err(err),
            None => {
                state.running = false;
                Ok(())
            }
        }
    }

    async fn relay_status(&self, _device_id: &DeviceId) -> Result<RelayStatus, RelayError> {
        Ok(RelayStatus {
            running: self.inner.lock().unwrap().running,
        })
    }

    async fn stream_descriptor(&self, _device_id: &DeviceId) -> Result<Option<String>, RelayError> {
        Ok(self.inner.lock().unwrap().descriptor.clone())
    }
}
