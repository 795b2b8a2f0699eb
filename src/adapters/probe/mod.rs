//! Probe adapters - backend health and stream availability checks.

mod http;
mod mock;

pub use http::HttpBackendProbe;
pub use mock::{MockBackendProbe, MockReachability};
