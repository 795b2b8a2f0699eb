//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application services and the outside world. Adapters implement
//! these ports.
//!
//! ## Session Ports
//!
//! - `RelayControl` - Remote stream relay lifecycle
//! - `TokenProvider` - Bearer tokens for backend calls
//! - `BackendProbe` - Backend health and stream availability checks
//! - `NetworkReachability` - Device-level network signal
//!
//! ## Link Ports
//!
//! - `LinkTransport` - One physical link to the device
//! - `LinkProbe` - Round-trip speed probe
//!
//! ## Telemetry Ports
//!
//! - `BrokerConnector` / `BrokerLink` - Publish/subscribe broker session

mod backend_probe;
mod broker;
mod link_transport;
mod relay_control;
mod token_provider;

pub use backend_probe::{BackendProbe, NetworkReachability, ProbeError};
pub use broker::{
    BrokerConnection, BrokerConnector, BrokerEndpoint, BrokerError, BrokerLink, LinkEvent,
};
pub use link_transport::{LinkConfig, LinkProbe, LinkTransport, TransportError};
pub use relay_control::{RelayControl, RelayError, RelayOptions, RelayStarted, RelayStatus};
pub use token_provider::{AuthError, TokenProvider};
