//! Broker adapters - MQTT and in-memory implementations of `BrokerConnector`.

mod in_memory;
mod mqtt;

pub use in_memory::{InMemoryBroker, PublishBehavior};
pub use mqtt::MqttConnector;
