//! camlink - live camera session client core
//!
//! Three coordinators make up the crate:
//!
//! - [`application::ConnectionHealthMonitor`] keeps the local device link up
//!   and classifies its quality
//! - [`application::EventBusClient`] carries device telemetry and commands
//!   over an MQTT broker
//! - [`application::LiveSessionOrchestrator`] turns "watch this device"
//!   into a playable stream URL
//!
//! External systems sit behind the traits in [`ports`]; [`adapters`] holds
//! the production implementations alongside in-memory ones for tests.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
