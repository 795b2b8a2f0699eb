//! Live session orchestrator.
//!
//! Turns "watch this device" into a playable stream URL:
//!
//! 1. Diagnose: optional network signal, then the backend health probe
//! 2. Start the remote relay, retrying with a fixed delay
//! 3. Resolve the stream URL (start response, else descriptor lookup)
//! 4. Poll stream availability until it answers or the deadline passes
//!
//! Only one session exists at a time: a `start` issued while another is
//! running, or while a session is already active, gets `SessionBusy`.
//! `stop` bumps the generation carried by the cancel channel, which
//! interrupts a running start and fences off any state write it still had
//! pending. It then holds the start lock until the relay is stopped and the
//! state reset, so no new start can slip in between.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::{sleep, sleep_until, timeout, Instant};

use crate::domain::foundation::{DeviceId, Observer, ObserverSet, StateMachine, Subscription};
use crate::domain::session::{
    AvailabilityPolicy, SessionError, SessionPhase, SessionStarted, SessionState,
    StreamAvailability, StreamQuality,
};
use crate::ports::{
    BackendProbe, NetworkReachability, RelayControl, RelayError, RelayOptions, RelayStarted,
};

/// Startup protocol timing and policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Total relay start calls, including the first.
    pub relay_attempts: u32,
    pub relay_retry_delay: Duration,
    /// Bound for each health probe and each availability check.
    pub probe_timeout: Duration,
    pub poll_interval: Duration,
    pub poll_deadline: Duration,
    pub availability_policy: AvailabilityPolicy,
    pub relay_options: RelayOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            relay_attempts: 3,
            relay_retry_delay: Duration::from_millis(1500),
            probe_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(800),
            poll_deadline: Duration::from_secs(30),
            availability_policy: AvailabilityPolicy::default(),
            relay_options: RelayOptions::default(),
        }
    }
}

/// Drives the startup/teardown protocol for one session at a time.
pub struct LiveSessionOrchestrator {
    relay: Arc<dyn RelayControl>,
    probe: Arc<dyn BackendProbe>,
    reachability: Option<Arc<dyn NetworkReachability>>,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
    phase: watch::Sender<SessionPhase>,
    observers: ObserverSet<SessionState>,
    /// Serializes state writes with their observer fan-out.
    notify_lock: StdMutex<()>,
    start_lock: Mutex<()>,
    /// Current generation; bumped by every `start` and `stop`.
    cancel: watch::Sender<u64>,
}

impl LiveSessionOrchestrator {
    pub fn new(relay: Arc<dyn RelayControl>, probe: Arc<dyn BackendProbe>) -> Self {
        let (state, _) = watch::channel(SessionState::idle());
        let (phase, _) = watch::channel(SessionPhase::Idle);
        let (cancel, _) = watch::channel(0);
        Self {
            relay,
            probe,
            reachability: None,
            config: SessionConfig::default(),
            state,
            phase,
            observers: ObserverSet::new(),
            notify_lock: StdMutex::new(()),
            start_lock: Mutex::new(()),
            cancel,
        }
    }

    /// Consults `signal` before the backend health probe.
    pub fn with_reachability(mut self, signal: Arc<dyn NetworkReachability>) -> Self {
        self.reachability = Some(signal);
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Observers run while state writes are serialized, so they must not
    /// call back into the orchestrator's mutators.
    pub fn subscribe(&self, observer: Arc<dyn Observer<SessionState>>) -> Subscription {
        self.observers.subscribe(observer)
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// Runs the full startup protocol for `device_id`.
    pub async fn start(&self, device_id: DeviceId) -> Result<SessionStarted, SessionError> {
        let _guard = self
            .start_lock
            .try_lock()
            .map_err(|_| SessionError::SessionBusy)?;

        let phase = self.phase();
        if phase == SessionPhase::Active || phase.is_starting() {
            tracing::warn!(device_id = %device_id, phase = %phase, "Live session already running");
            return Err(SessionError::SessionBusy);
        }

        self.cancel.send_modify(|generation| *generation += 1);
        let mut cancelled = self.cancel.subscribe();
        let generation = *cancelled.borrow_and_update();

        tracing::info!(device_id = %device_id, "Starting live session");
        self.apply(generation, |state| state.begin(device_id.clone()));

        let outcome = tokio::select! {
            biased;
            _ = cancelled.changed() => Err(SessionError::Cancelled),
            outcome = self.run_startup(generation, &device_id) => outcome,
        };

        match &outcome {
            Ok(started) => tracing::info!(
                device_id = %device_id,
                stream_url = %started.stream_url,
                availability = ?started.availability,
                "Live session active"
            ),
            Err(SessionError::Cancelled) => {
                tracing::info!(device_id = %device_id, "Live session start cancelled")
            }
            Err(err) => {
                tracing::error!(device_id = %device_id, code = %err.code(), error = %err, "Live session failed");
                if err.is_fatal() {
                    let message = err.to_string();
                    if self.apply(generation, |state| state.fail(message)) {
                        let _ = self.enter(generation, SessionPhase::Failed);
                    }
                }
            }
        }
        outcome
    }

    /// Interrupts any running start, stops the relay (best effort) and
    /// resets the session.
    pub async fn stop(&self) {
        if self.phase().is_starting() {
            tracing::info!("Cancelling live session start");
        }
        self.cancel.send_modify(|generation| *generation += 1);
        let generation = *self.cancel.borrow();

        // The cancelled start releases the lock as soon as it sees the bump.
        let _guard = self.start_lock.lock().await;

        let device_id = self.state.borrow().device_id.clone();
        if let Some(device_id) = device_id {
            match self.relay.stop_relay(&device_id).await {
                Ok(()) => tracing::info!(device_id = %device_id, "Relay stopped"),
                Err(e) => {
                    tracing::warn!(device_id = %device_id, error = %e, "Relay stop failed; ignoring")
                }
            }
        }

        if self.apply(generation, SessionState::reset) {
            let _ = self.enter(generation, SessionPhase::Idle);
            tracing::info!("Live session stopped");
        }
    }

    /// Returns the new value.
    pub fn toggle_recording(&self) -> bool {
        self.update_current(|state| state.is_recording = !state.is_recording)
            .is_recording
    }

    pub fn toggle_mic(&self) -> bool {
        self.update_current(|state| state.is_mic_on = !state.is_mic_on)
            .is_mic_on
    }

    pub fn toggle_move_mode(&self) -> bool {
        self.update_current(|state| state.move_mode = !state.move_mode)
            .move_mode
    }

    pub fn set_quality(&self, quality: StreamQuality) {
        self.update_current(|state| state.quality = quality);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.update_current(|state| state.error = error);
    }

    /// Whether the relay reports itself running for the current device.
    pub async fn relay_running(&self) -> Result<bool, RelayError> {
        let device_id = self.state.borrow().device_id.clone();
        match device_id {
            Some(device_id) => Ok(self.relay.relay_status(&device_id).await?.running),
            None => Ok(false),
        }
    }

    async fn run_startup(
        &self,
        generation: u64,
        device_id: &DeviceId,
    ) -> Result<SessionStarted, SessionError> {
        self.enter(generation, SessionPhase::Diagnosing)?;
        self.preflight().await?;

        self.enter(generation, SessionPhase::StartingRelay)?;
        let started = self.start_relay(device_id).await?;
        let stream_url = self.resolve_stream_url(device_id, started).await?;

        self.enter(generation, SessionPhase::PollingAvailability)?;
        let availability = self.await_availability(&stream_url).await?;

        if !self.apply(generation, |state| state.activate(stream_url.clone())) {
            return Err(SessionError::Cancelled);
        }
        self.enter(generation, SessionPhase::Active)?;

        Ok(SessionStarted {
            device_id: device_id.clone(),
            stream_url,
            availability,
        })
    }

    async fn preflight(&self) -> Result<(), SessionError> {
        if let Some(signal) = &self.reachability {
            if !signal.is_reachable().await {
                return Err(SessionError::preflight("device network", "link is down"));
            }
        }

        let endpoint = self.probe.health_endpoint();
        match timeout(self.config.probe_timeout, self.probe.check_health()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SessionError::preflight(endpoint, e.to_string())),
            Err(_) => Err(SessionError::preflight(
                endpoint,
                format!("timed out after {}ms", self.config.probe_timeout.as_millis()),
            )),
        }
    }

    /// Up to `relay_attempts` calls with a fixed delay between them.
    /// Errors the relay marks as not retryable end the loop early.
    async fn start_relay(&self, device_id: &DeviceId) -> Result<RelayStarted, SessionError> {
        let attempts = self.config.relay_attempts.max(1);
        let mut made = 0;
        let mut last_error = String::new();

        while made < attempts {
            made += 1;
            match self
                .relay
                .start_relay(device_id, &self.config.relay_options)
                .await
            {
                Ok(started) => {
                    tracing::info!(device_id = %device_id, attempt = made, "Relay started");
                    return Ok(started);
                }
                Err(e) => {
                    tracing::warn!(
                        device_id = %device_id,
                        attempt = made,
                        max_attempts = attempts,
                        error = %e,
                        "Relay start failed"
                    );
                    last_error = e.to_string();
                    if !e.is_retryable() {
                        break;
                    }
                    if made < attempts {
                        sleep(self.config.relay_retry_delay).await;
                    }
                }
            }
        }

        Err(SessionError::RelayStartFailed {
            attempts: made,
            last_error,
        })
    }

    async fn resolve_stream_url(
        &self,
        device_id: &DeviceId,
        started: RelayStarted,
    ) -> Result<String, SessionError> {
        if let Some(url) = started.hls_url.filter(|url| !url.is_empty()) {
            return Ok(url);
        }

        match self.relay.stream_descriptor(device_id).await {
            Ok(Some(url)) => Ok(url),
            Ok(None) => Err(SessionError::StreamResolutionFailed {
                device_id: device_id.to_string(),
            }),
            Err(e) => {
                tracing::warn!(device_id = %device_id, error = %e, "Stream lookup failed");
                Err(SessionError::StreamResolutionFailed {
                    device_id: device_id.to_string(),
                })
            }
        }
    }

    async fn await_availability(&self, stream_url: &str) -> Result<StreamAvailability, SessionError> {
        let deadline = Instant::now() + self.config.poll_deadline;

        loop {
            match timeout(self.config.probe_timeout, self.probe.stream_available(stream_url)).await {
                Ok(Ok(true)) => return Ok(StreamAvailability::Confirmed),
                Ok(Ok(false)) => tracing::debug!(stream_url = %stream_url, "Stream not ready yet"),
                Ok(Err(e)) => {
                    tracing::debug!(stream_url = %stream_url, error = %e, "Availability check failed")
                }
                Err(_) => tracing::debug!(stream_url = %stream_url, "Availability check timed out"),
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep_until((now + self.config.poll_interval).min(deadline)).await;
        }

        match self.config.availability_policy {
            AvailabilityPolicy::AssumeAvailable => {
                tracing::warn!(
                    stream_url = %stream_url,
                    waited_secs = self.config.poll_deadline.as_secs(),
                    "Stream availability unconfirmed; continuing"
                );
                Ok(StreamAvailability::Assumed)
            }
            AvailabilityPolicy::RequireConfirmation => Err(SessionError::AvailabilityUnconfirmed {
                waited: self.config.poll_deadline,
            }),
        }
    }

    /// Moves to `next` unless a newer generation took over.
    fn enter(&self, generation: u64, next: SessionPhase) -> Result<(), SessionError> {
        let mut outcome = Ok(());
        self.phase.send_if_modified(|phase| {
            if *self.cancel.borrow() != generation {
                outcome = Err(SessionError::Cancelled);
                return false;
            }
            match phase.transition_to(next) {
                Ok(next) => {
                    let changed = *phase != next;
                    if changed {
                        tracing::info!(from = %phase, to = %next, "Session phase changed");
                    }
                    *phase = next;
                    changed
                }
                Err(e) => {
                    outcome = Err(e.into());
                    false
                }
            }
        });
        outcome
    }

    /// Mutates the state if `generation` is still current and notifies
    /// observers. Returns false when fenced off.
    fn apply(&self, generation: u64, mutate: impl FnOnce(&mut SessionState)) -> bool {
        let _serial = self.notify_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut snapshot = None;
        self.state.send_if_modified(|state| {
            if *self.cancel.borrow() != generation {
                return false;
            }
            mutate(state);
            snapshot = Some(state.clone());
            true
        });

        match snapshot {
            Some(state) => {
                self.observers.notify(&state);
                true
            }
            None => false,
        }
    }

    /// Mutates the current state regardless of generation and returns the
    /// resulting snapshot.
    fn update_current(&self, mutate: impl FnOnce(&mut SessionState)) -> SessionState {
        let _serial = self.notify_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.state.send_modify(|state| {
            mutate(state);
            state.touch();
        });
        let snapshot = self.state.borrow().clone();
        self.observers.notify(&snapshot);
        snapshot
    }
}
