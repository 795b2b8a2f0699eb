//! In-memory broker for testing.
//!
//! Each `open` creates a fresh link whose events are driven by the test:
//!
//! ```ignore
//! let broker = InMemoryBroker::new();          // emits Connected on open
//! bus.connect(&url, &device).await?;
//! broker.deliver("devices/cam-1/status", br#"{"online":true}"#);
//! broker.drop_connection("keepalive timeout");
//! assert_eq!(broker.subscriptions().len(), 6);
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::ports::{
    BrokerConnection, BrokerConnector, BrokerEndpoint, BrokerError, BrokerLink, LinkEvent,
};

/// How the link answers publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishBehavior {
    Ack,
    Fail(BrokerError),
    /// Never acknowledge; the caller's timeout decides.
    Hang,
}

#[derive(Debug)]
struct BrokerState {
    auto_connect: bool,
    open_error: Option<BrokerError>,
    publish_behavior: PublishBehavior,
    events: Option<mpsc::Sender<LinkEvent>>,
    endpoints: Vec<BrokerEndpoint>,
    subscriptions: Vec<String>,
    published: Vec<(String, Vec<u8>)>,
    closed: bool,
}

/// Test double for `BrokerConnector`.
#[derive(Debug, Clone)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    /// Broker that reports `Connected` as soon as a link opens.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BrokerState {
                auto_connect: true,
                open_error: None,
                publish_behavior: PublishBehavior::Ack,
                events: None,
                endpoints: Vec::new(),
                subscriptions: Vec::new(),
                published: Vec::new(),
                closed: false,
            })),
        }
    }

    /// Broker whose links stay silent until the test emits events.
    pub fn manual() -> Self {
        let broker = Self::new();
        broker.state.lock().unwrap().auto_connect = false;
        broker
    }

    /// Makes the next `open` fail.
    pub fn with_open_error(self, error: BrokerError) -> Self {
        self.state.lock().unwrap().open_error = Some(error);
        self
    }

    pub fn set_publish_behavior(&self, behavior: PublishBehavior) {
        self.state.lock().unwrap().publish_behavior = behavior;
    }

    /// Pushes a raw event onto the current link. Returns false if no link
    /// is open or the client stopped listening.
    pub fn emit(&self, event: LinkEvent) -> bool {
        let state = self.state.lock().unwrap();
        match &state.events {
            Some(tx) => tx.try_send(event).is_ok(),
            None => false,
        }
    }

    /// Delivers an inbound message.
    pub fn deliver(&self, topic: &str, payload: &[u8]) -> bool {
        self.emit(LinkEvent::Message {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        })
    }

    /// Simulates a dropped connection followed by a reconnect attempt.
    pub fn drop_connection(&self, reason: &str) -> bool {
        self.emit(LinkEvent::Disconnected {
            reason: reason.to_string(),
        }) && self.emit(LinkEvent::Reconnecting)
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.state.lock().unwrap().subscriptions.clone()
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.state.lock().unwrap().published.clone()
    }

    /// Endpoints passed to `open`, oldest first.
    pub fn endpoints(&self) -> Vec<BrokerEndpoint> {
        self.state.lock().unwrap().endpoints.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl BrokerConnector for InMemoryBroker {
    async fn open(&self, endpoint: BrokerEndpoint) -> Result<BrokerConnection, BrokerError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.open_error.take() {
            return Err(err);
        }

        let (tx, rx) = mpsc::channel(64);
        if state.auto_connect {
            let _ = tx.try_send(LinkEvent::Connected);
        }
        state.events = Some(tx);
        state.endpoints.push(endpoint);
        state.closed = false;

        Ok(BrokerConnection {
            link: Arc::new(InMemoryLink {
                state: self.state.clone(),
            }),
            events: rx,
        })
    }
}

struct InMemoryLink {
    state: Arc<Mutex<BrokerState>>,
}

#[async_trait]
impl BrokerLink for InMemoryLink {
    async fn subscribe(&self, topic: &str) -> Result<(), BrokerError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(BrokerError::Closed);
        }
        state.subscriptions.push(topic.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let behavior = {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                return Err(BrokerError::Closed);
            }
            if state.publish_behavior == PublishBehavior::Ack {
                state.published.push((topic.to_string(), payload));
            }
            state.publish_behavior.clone()
        };

        match behavior {
            PublishBehavior::Ack => Ok(()),
            PublishBehavior::Fail(err) => Err(err),
            PublishBehavior::Hang => loop {
                sleep(Duration::from_secs(3600)).await;
            },
        }
    }

    async fn close(&self) -> Result<(), BrokerError> {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.events = None;
        Ok(())
    }
}
