//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application services to external systems:
//! - `relay` - Stream relay control (HTTP, mock)
//! - `auth` - Bearer token source
//! - `probe` - Backend health and stream availability (HTTP, mock)
//! - `link` - Device link transports and speed probe (TCP/HTTP, mock)
//! - `broker` - Publish/subscribe broker (MQTT, in-memory)

pub mod auth;
pub mod broker;
pub mod link;
pub mod probe;
pub mod relay;

pub use auth::StaticTokenProvider;
pub use broker::{InMemoryBroker, MqttConnector, PublishBehavior};
pub use link::{HttpLinkProbe, MockLinkProbe, MockLinkTransport, TcpLinkTransport};
pub use probe::{HttpBackendProbe, MockBackendProbe, MockReachability};
pub use relay::{HttpRelayConfig, HttpRelayControl, MockRelayControl};
