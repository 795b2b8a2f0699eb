//! Relay adapters - HTTP and mock implementations of `RelayControl`.

mod http;
mod mock;

pub use http::{HttpRelayConfig, HttpRelayControl};
pub use mock::MockRelayControl;
