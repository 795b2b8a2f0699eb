//! Broker Port - Publish/subscribe transport for device telemetry.
//!
//! A `BrokerConnector` opens a `BrokerConnection`: a handle for outbound
//! operations plus a channel of lifecycle and message events. The adapter
//! owns reconnection timing; the event bus client decides when to give up.
//!
//! # Event Ordering
//!
//! ```text
//! Connected → Message* → Disconnected → Reconnecting → Connected → ...
//! ```
//!
//! The event channel closes when the link is closed or dropped.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Everything an adapter needs to open a broker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub client_id: String,
    pub keep_alive: Duration,
    /// Fixed delay between reconnect attempts.
    pub reconnect_period: Duration,
}

/// Lifecycle and message events emitted by an open link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    Disconnected { reason: String },
    /// A reconnect attempt is starting.
    Reconnecting,
    Message { topic: String, payload: Vec<u8> },
}

/// Outbound half of an open broker session.
#[async_trait]
pub trait BrokerLink: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<(), BrokerError>;

    /// Resolves once the broker acknowledges the message.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError>;

    /// Stops the link. The event channel closes afterwards.
    async fn close(&self) -> Result<(), BrokerError>;
}

/// An open link together with its event stream.
pub struct BrokerConnection {
    pub link: Arc<dyn BrokerLink>,
    pub events: mpsc::Receiver<LinkEvent>,
}

/// Port for opening broker sessions.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    async fn open(&self, endpoint: BrokerEndpoint) -> Result<BrokerConnection, BrokerError>;
}

/// Broker errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    /// The link went down before the broker acknowledged.
    #[error("link closed")]
    Closed,
}
