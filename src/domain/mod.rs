//! Domain layer containing the session, link health and telemetry types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors, observers)
//! - `health` - Link status and quality classification
//! - `session` - Live session state, phases and errors
//! - `telemetry` - Broker topics, messages and bus lifecycle

pub mod foundation;
pub mod health;
pub mod session;
pub mod telemetry;
