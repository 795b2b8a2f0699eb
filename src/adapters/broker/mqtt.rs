//! MQTT Broker Connector - rumqttc implementation of `BrokerConnector`.
//!
//! # Acknowledged publish
//!
//! Publishes go out at QoS 1. rumqttc only reports the packet id once the
//! event loop writes the packet (`Outgoing::Publish(pkid)`), so each publish
//! parks a waiter in a FIFO under the same lock as `try_publish`. The event
//! loop binds the oldest unbound waiter to the next outgoing packet id and
//! resolves it on the matching `PubAck`.
//!
//! # Reconnection
//!
//! On a connection error all waiters fail with `BrokerError::Closed`, a
//! `Disconnected` event is emitted, and the loop sleeps for the reconnect
//! period before emitting `Reconnecting` and polling again. Giving up is the
//! caller's decision (`close`).

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, Transport};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::sleep;

use crate::ports::{
    BrokerConnection, BrokerConnector, BrokerEndpoint, BrokerError, BrokerLink, LinkEvent,
};

/// Capacity of the rumqttc request channel and of the event channel.
const CHANNEL_CAPACITY: usize = 64;

type AckWaiter = oneshot::Sender<Result<(), BrokerError>>;

/// Opens MQTT sessions.
#[derive(Debug, Clone, Default)]
pub struct MqttConnector;

impl MqttConnector {
    pub fn new() -> Self {
        Self
    }

    fn options(endpoint: &BrokerEndpoint) -> MqttOptions {
        let mut options =
            MqttOptions::new(endpoint.client_id.clone(), endpoint.host.clone(), endpoint.port);
        options.set_keep_alive(endpoint.keep_alive);
        options.set_clean_session(true);
        if endpoint.tls {
            options.set_transport(Transport::tls_with_default_config());
        }
        options
    }
}

#[async_trait]
impl BrokerConnector for MqttConnector {
    async fn open(&self, endpoint: BrokerEndpoint) -> Result<BrokerConnection, BrokerError> {
        if endpoint.host.is_empty() {
            return Err(BrokerError::Connection("empty broker host".to_string()));
        }

        let (client, eventloop) = AsyncClient::new(Self::options(&endpoint), CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let acks = Arc::new(AckTracker::default());

        tokio::spawn(drive(
            eventloop,
            acks.clone(),
            events_tx,
            shutdown_rx,
            endpoint.reconnect_period,
        ));

        tracing::info!(
            host = %endpoint.host,
            port = endpoint.port,
            tls = endpoint.tls,
            client_id = %endpoint.client_id,
            "MQTT link opened"
        );

        Ok(BrokerConnection {
            link: Arc::new(MqttLink {
                client,
                acks,
                shutdown: shutdown_tx,
            }),
            events: events_rx,
        })
    }
}

/// Outbound half of an MQTT session.
struct MqttLink {
    client: AsyncClient,
    acks: Arc<AckTracker>,
    shutdown: watch::Sender<bool>,
}

#[async_trait]
impl BrokerLink for MqttLink {
    async fn subscribe(&self, topic: &str) -> Result<(), BrokerError> {
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| BrokerError::Rejected(e.to_string()))
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let (tx, rx) = oneshot::channel();
        self.acks.enqueue(tx, || {
            self.client
                .try_publish(topic, QoS::AtLeastOnce, false, payload)
                .map_err(|e| BrokerError::Rejected(e.to_string()))
        })?;

        rx.await.unwrap_or(Err(BrokerError::Closed))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        let _ = self.shutdown.send(true);
        self.acks.fail_all();
        // The event loop is stopping; a full request queue is not an error here.
        if let Err(e) = self.client.try_disconnect() {
            tracing::debug!(error = %e, "MQTT disconnect request not queued");
        }
        Ok(())
    }
}

/// Pairs outgoing QoS 1 publishes with their PUBACKs.
#[derive(Default)]
struct AckTracker {
    inner: Mutex<AckState>,
}

#[derive(Default)]
struct AckState {
    unbound: VecDeque<AckWaiter>,
    inflight: HashMap<u16, AckWaiter>,
}

impl AckTracker {
    fn lock(&self) -> std::sync::MutexGuard<'_, AckState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `submit` and queues the waiter atomically, so waiters stay in
    /// request order.
    fn enqueue<F>(&self, waiter: AckWaiter, submit: F) -> Result<(), BrokerError>
    where
        F: FnOnce() -> Result<(), BrokerError>,
    {
        let mut state = self.lock();
        submit()?;
        state.unbound.push_back(waiter);
        Ok(())
    }

    fn bind(&self, pkid: u16) {
        let mut state = self.lock();
        if let Some(waiter) = state.unbound.pop_front() {
            state.inflight.insert(pkid, waiter);
        }
    }

    fn resolve(&self, pkid: u16) {
        if let Some(waiter) = self.lock().inflight.remove(&pkid) {
            let _ = waiter.send(Ok(()));
        }
    }

    fn fail_all(&self) {
        let mut state = self.lock();
        for waiter in state.unbound.drain(..) {
            let _ = waiter.send(Err(BrokerError::Closed));
        }
        for (_, waiter) in state.inflight.drain() {
            let _ = waiter.send(Err(BrokerError::Closed));
        }
    }
}

/// Polls the rumqttc event loop and translates its events.
async fn drive(
    mut eventloop: EventLoop,
    acks: Arc<AckTracker>,
    events: mpsc::Sender<LinkEvent>,
    mut shutdown: watch::Receiver<bool>,
    reconnect_period: Duration,
) {
    loop {
        let polled = tokio::select! {
            _ = shutdown.changed() => break,
            polled = eventloop.poll() => polled,
        };

        let event = match polled {
            Ok(Event::Incoming(Packet::ConnAck(_))) => Some(LinkEvent::Connected),
            Ok(Event::Incoming(Packet::Publish(publish))) => Some(LinkEvent::Message {
                topic: publish.topic.clone(),
                payload: publish.payload.to_vec(),
            }),
            Ok(Event::Incoming(Packet::PubAck(ack))) => {
                acks.resolve(ack.pkid);
                None
            }
            Ok(Event::Outgoing(Outgoing::Publish(pkid))) => {
                acks.bind(pkid);
                None
            }
            Ok(_) => None,
            Err(e) => {
                acks.fail_all();
                tracing::warn!(error = %e, "MQTT connection error");
                let down = LinkEvent::Disconnected {
                    reason: e.to_string(),
                };
                if events.send(down).await.is_err() {
                    break;
                }
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = sleep(reconnect_period) => {}
                }
                Some(LinkEvent::Reconnecting)
            }
        };

        if let Some(event) = event {
            if events.send(event).await.is_err() {
                break;
            }
        }
    }

    acks.fail_all();
    tracing::debug!("MQTT event loop stopped");
}
