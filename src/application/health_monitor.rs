//! Connection health monitor.
//!
//! Tracks the device link status, classifies its quality and drives the
//! primary/fallback transport strategy. The status is changed only through
//! the private `update` routine, which fans out to observers when the value
//! actually changes.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

use crate::domain::foundation::{Observer, ObserverSet, Subscription};
use crate::domain::health::{ConnectionQuality, ConnectionStatus, HealthError, SpeedTestResult};
use crate::ports::{LinkConfig, LinkProbe, LinkTransport, NetworkReachability};

/// Timing knobs for the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthMonitorConfig {
    /// Upper bound for a single transport connect attempt.
    pub attempt_timeout: Duration,
    /// Upper bound for `test_connection`.
    pub test_timeout: Duration,
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(10),
            test_timeout: Duration::from_secs(15),
        }
    }
}

/// Link status owner with a two-transport connect strategy.
pub struct ConnectionHealthMonitor {
    primary: Arc<dyn LinkTransport>,
    fallback: Arc<dyn LinkTransport>,
    probe: Arc<dyn LinkProbe>,
    config: HealthMonitorConfig,
    status: watch::Sender<ConnectionStatus>,
    observers: ObserverSet<ConnectionStatus>,
    last_config: Mutex<Option<LinkConfig>>,
}

impl ConnectionHealthMonitor {
    pub fn new(
        primary: Arc<dyn LinkTransport>,
        fallback: Arc<dyn LinkTransport>,
        probe: Arc<dyn LinkProbe>,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::disconnected());
        Self {
            primary,
            fallback,
            probe,
            config: HealthMonitorConfig::default(),
            status,
            observers: ObserverSet::new(),
            last_config: Mutex::new(None),
        }
    }

    pub fn with_config(mut self, config: HealthMonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Current status snapshot.
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// Quality tier of the current status.
    pub fn connection_quality(&self) -> ConnectionQuality {
        self.status.borrow().quality()
    }

    /// Registers an observer for status changes.
    pub fn subscribe(&self, observer: Arc<dyn Observer<ConnectionStatus>>) -> Subscription {
        self.observers.subscribe(observer)
    }

    /// Channel form of the status fan-out.
    pub fn watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Tries the primary transport, then the fallback.
    ///
    /// Each transport gets exactly one attempt bounded by the configured
    /// attempt timeout. The config is remembered for [`Self::auto_reconnect`].
    pub async fn setup_connection(
        &self,
        config: LinkConfig,
    ) -> Result<ConnectionStatus, HealthError> {
        *self
            .last_config
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(config.clone());

        let mut reasons = Vec::new();
        for transport in [&self.primary, &self.fallback] {
            let kind = transport.kind();
            match timeout(self.config.attempt_timeout, transport.connect(&config)).await {
                Ok(Ok(())) => {
                    let status = ConnectionStatus::connected_via(kind);
                    tracing::info!(
                        connection_type = %kind,
                        quality = %status.quality(),
                        "Device link established"
                    );
                    self.update(status.clone());
                    return Ok(status);
                }
                Ok(Err(e)) => {
                    tracing::warn!(connection_type = %kind, error = %e, "Link attempt failed");
                    reasons.push(format!("{}: {}", kind, e));
                }
                Err(_) => {
                    tracing::warn!(
                        connection_type = %kind,
                        timeout_ms = self.config.attempt_timeout.as_millis() as u64,
                        "Link attempt timed out"
                    );
                    reasons.push(format!(
                        "{}: timed out after {}ms",
                        kind,
                        self.config.attempt_timeout.as_millis()
                    ));
                }
            }
        }

        let reasons = reasons.join("; ");
        self.update(ConnectionStatus {
            error: Some(reasons.clone()),
            ..ConnectionStatus::disconnected()
        });
        Err(HealthError::ConnectionFailed { reasons })
    }

    /// Bounded round-trip probe. Leaves the status untouched.
    pub async fn test_connection(&self) -> Result<SpeedTestResult, HealthError> {
        match timeout(self.config.test_timeout, self.probe.round_trip()).await {
            Ok(Ok(result)) => {
                tracing::debug!(
                    ping_ms = result.ping_ms,
                    download_mbps = result.download_mbps,
                    upload_mbps = result.upload_mbps,
                    "Connectivity test finished"
                );
                Ok(result)
            }
            Ok(Err(e)) => Err(HealthError::ConnectivityTestFailed(e.to_string())),
            Err(_) => Err(HealthError::ConnectivityTestFailed(format!(
                "timed out after {}ms",
                self.config.test_timeout.as_millis()
            ))),
        }
    }

    /// Resets to disconnected. Observers hear about it only once.
    pub fn disconnect(&self) {
        if self.update(ConnectionStatus::disconnected()) {
            tracing::info!("Device link disconnected");
        }
    }

    /// Re-runs setup with the stored config if it opted in.
    pub async fn auto_reconnect(&self) -> Result<ConnectionStatus, HealthError> {
        let config = self
            .last_config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match config {
            Some(config) if config.auto_reconnect => self.setup_connection(config).await,
            _ => Err(HealthError::AutoReconnectDisabled),
        }
    }

    /// Single write path for the status. Returns true when it changed.
    fn update(&self, next: ConnectionStatus) -> bool {
        let changed = self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
        if changed {
            self.observers.notify(&next);
        }
        changed
    }
}

#[async_trait]
impl NetworkReachability for ConnectionHealthMonitor {
    async fn is_reachable(&self) -> bool {
        let connected = self.status.borrow().is_connected;
        connected
    }
}
