//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, error types and the observer
//! fan-out that form the vocabulary of the camlink domain.

mod errors;
mod ids;
mod observer;
mod state_machine;
mod timestamp;

pub use errors::{ErrorCode, ValidationError};
pub use ids::DeviceId;
pub use observer::{ChannelObserver, Observer, ObserverError, ObserverSet, Subscription};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
