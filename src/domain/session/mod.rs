//! Session module - live session state, phases and errors.

mod errors;
mod phase;
mod policy;
mod state;

pub use errors::SessionError;
pub use phase::SessionPhase;
pub use policy::AvailabilityPolicy;
pub use state::{SessionStarted, SessionState, StreamAvailability, StreamQuality};
