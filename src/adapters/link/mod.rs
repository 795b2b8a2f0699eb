//! Link adapters - physical transports and the speed probe.

mod mock;
mod tcp;

pub use http_speed_test::HttpLinkProbe;
pub use mock::{MockLinkProbe, MockLinkTransport};
pub use tcp::TcpLinkTransport;
