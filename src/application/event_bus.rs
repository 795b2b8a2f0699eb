//! Event bus client.
//!
//! Keeps one broker session per device, subscribes the fixed telemetry
//! topic set on every (re)connect and fans inbound messages out to
//! listeners registered per topic or on the wildcard topic.
//!
//! # Lifecycle
//!
//! ```text
//! connect() ──► Connecting ──Connected──► Connected ──Disconnected──► Disconnected
//!                   ▲                                                    │
//!                   └────────────────────── Reconnecting ◄───────────────┘
//!                                               │ attempts > cap
//!                                               ▼
//!                                          Unreachable
//! ```
//!
//! Link events are consumed by a spawned task. Each `connect` starts a new
//! generation; events from an older generation are ignored.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use uuid::Uuid;

use crate::domain::foundation::{
    ChannelObserver, DeviceId, Observer, ObserverSet, StateMachine, Subscription, Timestamp,
};
use crate::domain::telemetry::{
    stamp_payload, BrokerAddress, BusError, BusState, CommandKind, TelemetryMessage, TopicBuilder,
    WILDCARD_TOPIC,
};
use crate::ports::{BrokerConnector, BrokerEndpoint, BrokerLink, LinkEvent};

/// Event bus settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBusConfig {
    /// First topic segment.
    pub namespace: String,
    /// Client ids are `<prefix>-<random>`.
    pub client_id_prefix: String,
    pub keep_alive: Duration,
    /// Fixed delay between reconnect attempts.
    pub reconnect_period: Duration,
    /// `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,
    /// How long `send_command` waits for the broker acknowledgement.
    pub publish_timeout: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            namespace: "devices".to_string(),
            client_id_prefix: "camlink".to_string(),
            keep_alive: Duration::from_secs(60),
            reconnect_period: Duration::from_secs(5),
            max_reconnect_attempts: Some(10),
            publish_timeout: Duration::from_secs(5),
        }
    }
}

type Listeners = Arc<ObserverSet<TelemetryMessage>>;

struct ActiveLink {
    link: Arc<dyn BrokerLink>,
    task: JoinHandle<()>,
}

struct BusInner {
    connector: Arc<dyn BrokerConnector>,
    config: EventBusConfig,
    topics: TopicBuilder,
    state: watch::Sender<BusState>,
    reconnect_attempts: AtomicU32,
    generation: AtomicU64,
    active: Mutex<Option<ActiveLink>>,
    registry: RwLock<HashMap<String, Listeners>>,
    connection_observers: ObserverSet<bool>,
}

/// Publish/subscribe client for device telemetry and commands.
#[derive(Clone)]
pub struct EventBusClient {
    inner: Arc<BusInner>,
}

impl EventBusClient {
    pub fn new(connector: Arc<dyn BrokerConnector>, config: EventBusConfig) -> Self {
        let (state, _) = watch::channel(BusState::Disconnected);
        let topics = TopicBuilder::new(config.namespace.clone());
        Self {
            inner: Arc::new(BusInner {
                connector,
                config,
                topics,
                state,
                reconnect_attempts: AtomicU32::new(0),
                generation: AtomicU64::new(0),
                active: Mutex::new(None),
                registry: RwLock::new(HashMap::new()),
                connection_observers: ObserverSet::new(),
            }),
        }
    }

    /// Opens a broker session for `device_id`.
    ///
    /// Returns once the transport is open; `Connected` is reported
    /// asynchronously through the state channel and connection observers.
    /// An existing session is closed first.
    pub async fn connect(&self, broker_url: &str, device_id: &DeviceId) -> Result<(), BusError> {
        let address = BrokerAddress::parse(broker_url)?;
        self.inner.close_active().await;

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.reconnect_attempts.store(0, Ordering::SeqCst);
        self.inner.set_state(BusState::Connecting);

        let endpoint = BrokerEndpoint {
            host: address.host,
            port: address.port,
            tls: address.tls,
            client_id: format!(
                "{}-{}",
                self.inner.config.client_id_prefix,
                Uuid::new_v4().simple()
            ),
            keep_alive: self.inner.config.keep_alive,
            reconnect_period: self.inner.config.reconnect_period,
        };

        tracing::info!(
            broker = %broker_url,
            device_id = %device_id,
            client_id = %endpoint.client_id,
            "Connecting to event bus"
        );

        let connection = match self.inner.connector.open(endpoint).await {
            Ok(connection) => connection,
            Err(e) => {
                self.inner.set_state(BusState::Disconnected);
                tracing::error!(broker = %broker_url, error = %e, "Event bus connect failed");
                return Err(BusError::ConnectFailed(e.to_string()));
            }
        };

        let link = connection.link;
        let task = tokio::spawn(pump(
            self.inner.clone(),
            link.clone(),
            device_id.clone(),
            connection.events,
            generation,
        ));

        *self.inner.lock_active() = Some(ActiveLink { link, task });
        Ok(())
    }

    /// Registers a listener for `topic` (or [`WILDCARD_TOPIC`]).
    ///
    /// Returns false when the same listener is already registered there.
    pub fn subscribe(&self, topic: &str, listener: Arc<dyn Observer<TelemetryMessage>>) -> bool {
        let listeners = {
            let mut registry = self
                .inner
                .registry
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            registry
                .entry(topic.to_string())
                .or_insert_with(|| Arc::new(ObserverSet::new()))
                .clone()
        };
        listeners.insert(listener)
    }

    /// Removes a listener. Returns false when it was not registered.
    pub fn unsubscribe(&self, topic: &str, listener: &Arc<dyn Observer<TelemetryMessage>>) -> bool {
        let mut registry = self
            .inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(listeners) = registry.get(topic) else {
            return false;
        };
        let removed = listeners.remove(listener);
        if listeners.is_empty() {
            registry.remove(topic);
        }
        removed
    }

    /// Channel form of [`Self::subscribe`]. Dropping the receiver
    /// unsubscribes on the next dispatch.
    pub fn stream(&self, topic: &str) -> mpsc::UnboundedReceiver<TelemetryMessage> {
        let (observer, receiver) = ChannelObserver::new();
        self.subscribe(topic, Arc::new(observer));
        receiver
    }

    /// Registers an observer for connected/disconnected changes.
    pub fn subscribe_connection(&self, observer: Arc<dyn Observer<bool>>) -> Subscription {
        self.inner.connection_observers.subscribe(observer)
    }

    /// Publishes a command and waits for the broker acknowledgement.
    pub async fn send_command(
        &self,
        device_id: &DeviceId,
        kind: CommandKind,
        payload: Value,
    ) -> Result<(), BusError> {
        if !self.state().is_connected() {
            tracing::warn!(device_id = %device_id, command = %kind, "Command dropped: not connected");
            return Err(BusError::NotConnected);
        }
        let link = self
            .inner
            .lock_active()
            .as_ref()
            .map(|active| active.link.clone())
            .ok_or(BusError::NotConnected)?;

        let topic = self.inner.topics.command(device_id, kind);
        let body = stamp_payload(payload, Timestamp::now().as_unix_millis());
        let bytes = serde_json::to_vec(&body).map_err(|e| BusError::PublishFailed {
            topic: topic.clone(),
            reason: e.to_string(),
        })?;

        let outcome = match timeout(self.inner.config.publish_timeout, link.publish(&topic, bytes)).await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "not acknowledged within {}ms",
                self.inner.config.publish_timeout.as_millis()
            )),
        };

        match outcome {
            Ok(()) => {
                tracing::debug!(topic = %topic, "Command acknowledged");
                Ok(())
            }
            Err(reason) => {
                tracing::error!(topic = %topic, reason = %reason, "Command publish failed");
                Err(BusError::PublishFailed { topic, reason })
            }
        }
    }

    /// Tears the session down and forgets every listener.
    ///
    /// Connection observers are cleared before the state changes, so they
    /// do not hear about this disconnect.
    pub async fn disconnect(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.close_active().await;
        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.inner.connection_observers.clear();
        self.inner.set_state(BusState::Disconnected);
        tracing::info!("Event bus disconnected");
    }

    pub fn state(&self) -> BusState {
        *self.inner.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<BusState> {
        self.inner.state.subscribe()
    }

    /// Reconnect attempts since the last successful connect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.reconnect_attempts.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn dispatch(&self, topic: &str, payload: &[u8]) -> usize {
        self.inner.dispatch(topic, payload)
    }
}

impl BusInner {
    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActiveLink>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn close_active(&self) {
        let active = self.lock_active().take();
        if let Some(active) = active {
            if let Err(e) = active.link.close().await {
                tracing::warn!(error = %e, "Failed to close broker link");
            }
            active.task.abort();
        }
    }

    fn set_state(&self, next: BusState) {
        let current = *self.state.borrow();
        if current == next {
            return;
        }
        if !current.can_transition_to(&next) {
            tracing::warn!(from = %current, to = %next, "Unexpected event bus transition");
        }
        self.state.send_replace(next);
        tracing::debug!(from = %current, to = %next, "Event bus state changed");
    }

    fn dispatch(&self, topic: &str, payload: &[u8]) -> usize {
        let message = match TelemetryMessage::decode(topic, payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(topic = %topic, error = %e, "Dropping undecodable message");
                return 0;
            }
        };

        // Snapshot under the read lock; listeners run without it.
        let (exact, wildcard) = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            (
                registry.get(topic).cloned(),
                registry.get(WILDCARD_TOPIC).cloned(),
            )
        };

        let mut delivered = 0;
        if let Some(listeners) = exact {
            delivered += listeners.notify(&message);
        }
        if let Some(listeners) = wildcard {
            delivered += listeners.notify(&message);
        }
        tracing::debug!(topic = %topic, delivered, "Message dispatched");
        delivered
    }

    async fn on_connected(&self, link: &Arc<dyn BrokerLink>, device_id: &DeviceId) {
        self.set_state(BusState::Connected);
        self.reconnect_attempts.store(0, Ordering::SeqCst);

        for topic in self.topics.telemetry_topics(device_id) {
            if let Err(e) = link.subscribe(&topic).await {
                tracing::warn!(topic = %topic, error = %e, "Topic subscription failed");
            }
        }

        tracing::info!(device_id = %device_id, "Event bus connected");
        self.connection_observers.notify(&true);
    }

    fn on_disconnected(&self, reason: &str) {
        if *self.state.borrow() == BusState::Disconnected {
            return;
        }
        self.set_state(BusState::Disconnected);
        tracing::warn!(reason = %reason, "Event bus connection lost");
        self.connection_observers.notify(&false);
    }

    /// Returns false once the reconnect cap is exceeded.
    fn on_reconnecting(&self) -> bool {
        let attempts = self.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(max) = self.config.max_reconnect_attempts {
            if attempts > max {
                self.set_state(BusState::Unreachable);
                let err = BusError::BrokerUnreachable { attempts: max };
                tracing::error!(code = %err.code(), error = %err, "Giving up on event bus");
                return false;
            }
        }

        self.set_state(BusState::Connecting);
        tracing::info!(attempt = attempts, "Event bus reconnecting");
        true
    }
}

/// Consumes link events for one connection generation.
async fn pump(
    inner: Arc<BusInner>,
    link: Arc<dyn BrokerLink>,
    device_id: DeviceId,
    mut events: mpsc::Receiver<LinkEvent>,
    generation: u64,
) {
    while let Some(event) = events.recv().await {
        if inner.generation.load(Ordering::SeqCst) != generation {
            break;
        }
        match event {
            LinkEvent::Connected => inner.on_connected(&link, &device_id).await,
            LinkEvent::Disconnected { reason } => inner.on_disconnected(&reason),
            LinkEvent::Reconnecting => {
                if !inner.on_reconnecting() {
                    if let Err(e) = link.close().await {
                        tracing::warn!(error = %e, "Failed to close broker link");
                    }
                    break;
                }
            }
            LinkEvent::Message { topic, payload } => {
                inner.dispatch(&topic, &payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryBroker, PublishBehavior};
    use crate::domain::foundation::ObserverError;
    use crate::ports::BrokerError;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    const URL: &str = "mqtt://broker.test:1883";

    fn cam() -> DeviceId {
        DeviceId::new("cam-1").unwrap()
    }

    fn client(broker: &InMemoryBroker) -> EventBusClient {
        EventBusClient::new(Arc::new(broker.clone()), EventBusConfig::default())
    }

    fn counting() -> (Arc<AtomicUsize>, Arc<dyn Observer<TelemetryMessage>>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let listener: Arc<dyn Observer<TelemetryMessage>> =
            Arc::new(move |_: &TelemetryMessage| -> Result<(), ObserverError> {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        (count, listener)
    }

    async fn wait_for(bus: &EventBusClient, target: BusState) {
        let mut rx = bus.watch_state();
        timeout(Duration::from_secs(5), rx.wait_for(|s| *s == target))
            .await
            .expect("state not reached")
            .unwrap();
    }

    #[test]
    fn fans_out_to_exact_and_wildcard_only() {
        let bus = client(&InMemoryBroker::new());
        let (exact, exact_listener) = counting();
        let (wild, wild_listener) = counting();
        let (other, other_listener) = counting();
        bus.subscribe("devices/cam-1/motion", exact_listener);
        bus.subscribe(WILDCARD_TOPIC, wild_listener);
        bus.subscribe("devices/cam-1/sound", other_listener);

        let delivered = bus.dispatch("devices/cam-1/motion", br#"{"detected":true}"#);

        assert_eq!(delivered, 2);
        assert_eq!(exact.load(Ordering::SeqCst), 1);
        assert_eq!(wild.load(Ordering::SeqCst), 1);
        assert_eq!(other.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failing_listener_does_not_block_the_rest() {
        let bus = client(&InMemoryBroker::new());
        bus.subscribe(
            "t",
            Arc::new(|_: &TelemetryMessage| -> Result<(), ObserverError> {
                Err(ObserverError::failed("bad listener"))
            }),
        );
        bus.subscribe(
            "t",
            Arc::new(|_: &TelemetryMessage| -> Result<(), ObserverError> { panic!("boom") }),
        );
        let (count, listener) = counting();
        bus.subscribe("t", listener);

        bus.dispatch("t", b"{}");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_exact_listener_still_reaches_wildcard() {
        let bus = client(&InMemoryBroker::new());
        bus.subscribe(
            "devices/cam-1/status",
            Arc::new(|_: &TelemetryMessage| -> Result<(), ObserverError> { panic!("boom") }),
        );
        let (wild, wild_listener) = counting();
        let (motion, motion_listener) = counting();
        bus.subscribe(WILDCARD_TOPIC, wild_listener);
        bus.subscribe("devices/cam-1/motion", motion_listener);

        let delivered = bus.dispatch("devices/cam-1/status", br#"{"online":true}"#);

        assert_eq!(delivered, 1);
        assert_eq!(wild.load(Ordering::SeqCst), 1);
        assert_eq!(motion.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duplicate_registration_invokes_once() {
        let bus = client(&InMemoryBroker::new());
        let (count, listener) = counting();
        assert!(bus.subscribe("t", listener.clone()));
        assert!(!bus.subscribe("t", listener.clone()));

        bus.dispatch("t", b"{}");
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(bus.unsubscribe("t", &listener));
        assert!(!bus.unsubscribe("t", &listener));
        bus.dispatch("t", b"{}");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn undecodable_message_is_dropped() {
        let bus = client(&InMemoryBroker::new());
        let (count, listener) = counting();
        bus.subscribe(WILDCARD_TOPIC, listener);

        assert_eq!(bus.dispatch("t", b"\xff not json"), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn closed_stream_is_pruned() {
        let bus = client(&InMemoryBroker::new());
        let rx = bus.stream("t");
        drop(rx);
        bus.dispatch("t", b"{}");
        let registry = bus.inner.registry.read().unwrap();
        assert!(registry.get("t").map_or(true, |set| set.is_empty()));
    }

    #[tokio::test]
    async fn connect_subscribes_fixed_topics_and_notifies() {
        let broker = InMemoryBroker::new();
        let bus = client(&broker);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = bus.subscribe_connection(Arc::new(move |up: &bool| -> Result<(), ObserverError> {
            tx.send(*up).map_err(|_| ObserverError::Closed)
        }));

        bus.connect(URL, &cam()).await.unwrap();

        assert_eq!(rx.recv().await, Some(true));
        assert_eq!(bus.state(), BusState::Connected);
        assert_eq!(
            broker.subscriptions(),
            TopicBuilder::new("devices").telemetry_topics(&cam())
        );
        let endpoint = &broker.endpoints()[0];
        assert_eq!(endpoint.host, "broker.test");
        assert!(endpoint.client_id.starts_with("camlink-"));
    }

    #[tokio::test]
    async fn inbound_message_reaches_stream() {
        let broker = InMemoryBroker::new();
        let bus = client(&broker);
        let mut status = bus.stream("devices/cam-1/status");
        bus.connect(URL, &cam()).await.unwrap();

        broker.deliver("devices/cam-1/status", br#"{"online":true}"#);

        let message = timeout(Duration::from_secs(5), status.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.payload["online"], true);
    }

    #[tokio::test]
    async fn invalid_broker_url_is_rejected_before_opening() {
        let broker = InMemoryBroker::new();
        let bus = client(&broker);
        let err = bus.connect("http://broker", &cam()).await.unwrap_err();
        assert!(matches!(err, BusError::InvalidBrokerUrl { .. }));
        assert!(broker.endpoints().is_empty());
        assert_eq!(bus.state(), BusState::Disconnected);
    }

    #[tokio::test]
    async fn open_failure_reports_connect_failed() {
        let broker =
            InMemoryBroker::new().with_open_error(BrokerError::Connection("refused".into()));
        let bus = client(&broker);
        let err = bus.connect(URL, &cam()).await.unwrap_err();
        assert!(matches!(err, BusError::ConnectFailed(_)));
        assert_eq!(bus.state(), BusState::Disconnected);
    }

    #[tokio::test]
    async fn send_command_requires_connection() {
        let bus = client(&InMemoryBroker::new());
        let err = bus
            .send_command(&cam(), CommandKind::Capture, json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, BusError::NotConnected);
    }

    #[tokio::test]
    async fn send_command_publishes_stamped_payload() {
        let broker = InMemoryBroker::new();
        let bus = client(&broker);
        bus.connect(URL, &cam()).await.unwrap();
        wait_for(&bus, BusState::Connected).await;

        bus.send_command(&cam(), CommandKind::Ptz, json!({"pan": 15, "tilt": -5}))
            .await
            .unwrap();

        let published = broker.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "devices/cam-1/ptz/command");
        let body: Value = serde_json::from_slice(&published[0].1).unwrap();
        assert_eq!(body["pan"], 15);
        assert!(body["timestamp"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn send_command_surfaces_publish_failure() {
        let broker = InMemoryBroker::new();
        let bus = client(&broker);
        bus.connect(URL, &cam()).await.unwrap();
        wait_for(&bus, BusState::Connected).await;
        broker.set_publish_behavior(PublishBehavior::Fail(BrokerError::Rejected("quota".into())));

        let err = bus
            .send_command(&cam(), CommandKind::Zoom, json!({"level": 2}))
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::PublishFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn send_command_times_out_without_ack() {
        let broker = InMemoryBroker::new();
        let bus = client(&broker);
        bus.connect(URL, &cam()).await.unwrap();
        wait_for(&bus, BusState::Connected).await;
        broker.set_publish_behavior(PublishBehavior::Hang);

        let err = bus
            .send_command(&cam(), CommandKind::RecordingStart, json!({}))
            .await
            .unwrap_err();
        let BusError::PublishFailed { reason, .. } = err else {
            panic!("expected PublishFailed");
        };
        assert!(reason.contains("not acknowledged"));
    }

    #[tokio::test]
    async fn dropped_connection_notifies_false_and_counts_retries() {
        let broker = InMemoryBroker::new();
        let bus = client(&broker);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = bus.subscribe_connection(Arc::new(move |up: &bool| -> Result<(), ObserverError> {
            tx.send(*up).map_err(|_| ObserverError::Closed)
        }));
        bus.connect(URL, &cam()).await.unwrap();
        assert_eq!(rx.recv().await, Some(true));

        broker.drop_connection("keepalive timeout");
        assert_eq!(rx.recv().await, Some(false));
        wait_for(&bus, BusState::Connecting).await;
        assert_eq!(bus.reconnect_attempts(), 1);

        broker.emit(LinkEvent::Connected);
        assert_eq!(rx.recv().await, Some(true));
        assert_eq!(bus.reconnect_attempts(), 0);
        // Topics are subscribed again after the reconnect.
        assert_eq!(broker.subscriptions().len(), 12);
    }

    #[tokio::test]
    async fn reconnect_cap_moves_to_unreachable() {
        let broker = InMemoryBroker::new();
        let config = EventBusConfig {
            max_reconnect_attempts: Some(2),
            ..EventBusConfig::default()
        };
        let bus = EventBusClient::new(Arc::new(broker.clone()), config);
        bus.connect(URL, &cam()).await.unwrap();
        wait_for(&bus, BusState::Connected).await;

        broker.drop_connection("down");
        broker.drop_connection("still down");
        broker.drop_connection("still down");

        wait_for(&bus, BusState::Unreachable).await;
        assert_eq!(bus.reconnect_attempts(), 3);
        timeout(Duration::from_secs(5), async {
            while !broker.is_closed() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("link was not closed");
    }

    #[tokio::test]
    async fn disconnect_clears_listeners_silently() {
        let broker = InMemoryBroker::new();
        let bus = client(&broker);
        let (count, listener) = counting();
        bus.subscribe(WILDCARD_TOPIC, listener);
        let (up_count, up_observer) = {
            let count = Arc::new(AtomicUsize::new(0));
            let seen = count.clone();
            let observer: Arc<dyn Observer<bool>> =
                Arc::new(move |_: &bool| -> Result<(), ObserverError> {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
            (count, observer)
        };
        let _sub = bus.subscribe_connection(up_observer);

        bus.connect(URL, &cam()).await.unwrap();
        wait_for(&bus, BusState::Connected).await;
        let notified = up_count.load(Ordering::SeqCst);

        bus.disconnect().await;

        assert_eq!(bus.state(), BusState::Disconnected);
        assert!(broker.is_closed());
        assert_eq!(up_count.load(Ordering::SeqCst), notified);
        assert_eq!(bus.dispatch("t", b"{}"), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
