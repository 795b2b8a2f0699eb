//! Telemetry module - broker topics, inbound messages and bus lifecycle.

mod errors;
mod message;
mod state;
mod topics;

pub use errors::BusError;
pub use message::{stamp_payload, TelemetryMessage};
pub use state::BusState;
pub use topics::{BrokerAddress, CommandKind, TelemetryChannel, TopicBuilder, WILDCARD_TOPIC};
