//! Application layer - the three coordinators.
//!
//! Each coordinator owns its state behind a `watch` channel plus an
//! observer set, and talks to the outside world only through ports.

mod event_bus;
mod health_monitor;
mod live_session;

pub use event_bus::{EventBusClient, EventBusConfig};
pub use health_monitor::{ConnectionHealthMonitor, HealthMonitorConfig};
pub use live_session::{LiveSessionOrchestrator, SessionConfig};
