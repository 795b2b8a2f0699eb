//! Integration tests for the device event bus.
//!
//! Drives `EventBusClient` against the in-memory broker through a full
//! session lifecycle:
//! 1. Connect and subscribe to the device's telemetry channels
//! 2. Fan inbound telemetry out to exact and wildcard listeners
//! 3. Publish acknowledged commands
//! 4. Survive a dropped connection and resubscribe
//! 5. Give up after the reconnect cap and tear down cleanly

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

use camlink::adapters::{InMemoryBroker, PublishBehavior};
use camlink::application::{EventBusClient, EventBusConfig};
use camlink::domain::foundation::{DeviceId, ErrorCode, Observer, ObserverError};
use camlink::domain::telemetry::{BusError, BusState, CommandKind, TelemetryMessage, WILDCARD_TOPIC};
use camlink::ports::LinkEvent;

const BROKER_URL: &str = "mqtts://broker.example.com";

// =============================================================================
// Test Infrastructure
// =============================================================================

fn cam() -> DeviceId {
    DeviceId::new("cam-9").unwrap()
}

fn bus_with(broker: &InMemoryBroker, config: EventBusConfig) -> EventBusClient {
    EventBusClient::new(Arc::new(broker.clone()), config)
}

async fn wait_for_state(bus: &EventBusClient, target: BusState) {
    let mut rx = bus.watch_state();
    timeout(Duration::from_secs(5), rx.wait_for(|state| *state == target))
        .await
        .expect("state not reached in time")
        .expect("state channel closed");
}

/// Records connection flips in order.
fn connection_log(bus: &EventBusClient) -> (Arc<Mutex<Vec<bool>>>, camlink::domain::foundation::Subscription) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let observer: Arc<dyn Observer<bool>> =
        Arc::new(move |connected: &bool| -> Result<(), ObserverError> {
            sink.lock().unwrap().push(*connected);
            Ok(())
        });
    let subscription = bus.subscribe_connection(observer);
    (log, subscription)
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn telemetry_flows_to_exact_and_wildcard_listeners() {
    let broker = InMemoryBroker::new();
    let bus = bus_with(&broker, EventBusConfig::default());
    let mut status = bus.stream("devices/cam-9/status");
    let mut everything = bus.stream(WILDCARD_TOPIC);

    bus.connect(BROKER_URL, &cam()).await.unwrap();
    wait_for_state(&bus, BusState::Connected).await;

    let endpoint = &broker.endpoints()[0];
    assert_eq!(endpoint.host, "broker.example.com");
    assert_eq!(endpoint.port, 8883);
    assert!(endpoint.tls);
    assert!(endpoint.client_id.starts_with("camlink-"));
    assert_eq!(broker.subscriptions().len(), 6);

    broker.deliver("devices/cam-9/status", br#"{"online":true}"#);
    broker.deliver("devices/cam-9/motion", br#"{"zone":2}"#);
    broker.deliver("devices/cam-9/sound", b"garbage");

    let first = timeout(Duration::from_secs(1), status.recv()).await.unwrap().unwrap();
    assert_eq!(first.payload["online"], true);

    let a = timeout(Duration::from_secs(1), everything.recv()).await.unwrap().unwrap();
    let b = timeout(Duration::from_secs(1), everything.recv()).await.unwrap().unwrap();
    assert_eq!(a.topic, "devices/cam-9/status");
    assert_eq!(b.topic, "devices/cam-9/motion");

    // The undecodable message never reaches anyone.
    tokio::task::yield_now().await;
    assert!(everything.try_recv().is_err());
    assert!(status.try_recv().is_err());
}

#[tokio::test]
async fn erroring_status_listener_does_not_starve_wildcard() {
    let broker = InMemoryBroker::new();
    let bus = bus_with(&broker, EventBusConfig::default());
    let failing: Arc<dyn Observer<TelemetryMessage>> =
        Arc::new(|_: &TelemetryMessage| -> Result<(), ObserverError> {
            Err(ObserverError::failed("renderer gone"))
        });
    bus.subscribe("devices/cam-9/status", failing);
    let mut everything = bus.stream(WILDCARD_TOPIC);
    let mut motion = bus.stream("devices/cam-9/motion");

    bus.connect(BROKER_URL, &cam()).await.unwrap();
    wait_for_state(&bus, BusState::Connected).await;
    broker.deliver("devices/cam-9/status", br#"{"online":true}"#);

    let seen = timeout(Duration::from_secs(1), everything.recv()).await.unwrap().unwrap();
    assert_eq!(seen.topic, "devices/cam-9/status");
    tokio::task::yield_now().await;
    assert!(everything.try_recv().is_err());
    assert!(motion.try_recv().is_err());
}

#[tokio::test]
async fn commands_are_acknowledged_and_timestamped() {
    let broker = InMemoryBroker::new();
    let bus = bus_with(&broker, EventBusConfig::default());
    bus.connect(BROKER_URL, &cam()).await.unwrap();
    wait_for_state(&bus, BusState::Connected).await;

    bus.send_command(&cam(), CommandKind::Zoom, json!({"level": 3}))
        .await
        .unwrap();
    bus.send_command(&cam(), CommandKind::Capture, Value::Null)
        .await
        .unwrap();

    let published = broker.published();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].0, "devices/cam-9/zoom/command");
    let body: Value = serde_json::from_slice(&published[0].1).unwrap();
    assert_eq!(body["level"], 3);
    assert!(body["timestamp"].as_i64().unwrap() > 0);
    assert_eq!(published[1].0, "devices/cam-9/capture/command");
}

#[tokio::test(start_paused = true)]
async fn unacknowledged_command_times_out() {
    let broker = InMemoryBroker::new();
    let config = EventBusConfig {
        publish_timeout: Duration::from_secs(2),
        ..EventBusConfig::default()
    };
    let bus = bus_with(&broker, config);
    bus.connect(BROKER_URL, &cam()).await.unwrap();
    wait_for_state(&bus, BusState::Connected).await;
    broker.set_publish_behavior(PublishBehavior::Hang);

    let err = bus
        .send_command(&cam(), CommandKind::Ptz, json!({"pan": 5}))
        .await
        .unwrap_err();

    assert!(matches!(err, BusError::PublishFailed { .. }));
    assert_eq!(err.code(), ErrorCode::PublishFailed);
}

#[tokio::test]
async fn dropped_connection_recovers_and_resubscribes() {
    let broker = InMemoryBroker::new();
    let bus = bus_with(&broker, EventBusConfig::default());
    let (log, _sub) = connection_log(&bus);
    bus.connect(BROKER_URL, &cam()).await.unwrap();
    wait_for_state(&bus, BusState::Connected).await;

    assert!(broker.drop_connection("keepalive timeout"));
    wait_for_state(&bus, BusState::Connecting).await;
    assert_eq!(bus.reconnect_attempts(), 1);

    let err = bus
        .send_command(&cam(), CommandKind::RecordingStart, Value::Null)
        .await
        .unwrap_err();
    assert_eq!(err, BusError::NotConnected);

    assert!(broker.emit(LinkEvent::Connected));
    wait_for_state(&bus, BusState::Connected).await;

    assert_eq!(bus.reconnect_attempts(), 0);
    assert_eq!(broker.subscriptions().len(), 12);
    assert_eq!(*log.lock().unwrap(), vec![true, false, true]);
}

#[tokio::test]
async fn reconnect_cap_marks_broker_unreachable() {
    let broker = InMemoryBroker::new();
    let config = EventBusConfig {
        max_reconnect_attempts: Some(2),
        ..EventBusConfig::default()
    };
    let bus = bus_with(&broker, config);
    bus.connect(BROKER_URL, &cam()).await.unwrap();
    wait_for_state(&bus, BusState::Connected).await;

    broker.drop_connection("gone");
    broker.emit(LinkEvent::Reconnecting);
    broker.emit(LinkEvent::Reconnecting);

    wait_for_state(&bus, BusState::Unreachable).await;
    assert!(broker.is_closed());
    assert!(!bus.state().is_connected());
}

#[tokio::test]
async fn disconnect_forgets_listeners_and_allows_reconnect() {
    let broker = InMemoryBroker::new();
    let bus = bus_with(&broker, EventBusConfig::default());
    let (log, _sub) = connection_log(&bus);
    let mut status = bus.stream("devices/cam-9/status");
    bus.connect(BROKER_URL, &cam()).await.unwrap();
    wait_for_state(&bus, BusState::Connected).await;

    bus.disconnect().await;

    assert_eq!(bus.state(), BusState::Disconnected);
    assert!(broker.is_closed());
    // Observers are dropped before the state flips, so no `false`.
    assert_eq!(*log.lock().unwrap(), vec![true]);
    // The listener registry went with it.
    assert!(status.recv().await.is_none());

    bus.connect(BROKER_URL, &cam()).await.unwrap();
    wait_for_state(&bus, BusState::Connected).await;
    assert_eq!(broker.endpoints().len(), 2);
}

#[tokio::test]
async fn connect_rejects_bad_url_without_opening() {
    let broker = InMemoryBroker::new();
    let bus = bus_with(&broker, EventBusConfig::default());

    let err = bus.connect("http://broker", &cam()).await.unwrap_err();

    assert!(matches!(err, BusError::InvalidBrokerUrl { .. }));
    assert!(broker.endpoints().is_empty());
    assert_eq!(bus.state(), BusState::Disconnected);
}
