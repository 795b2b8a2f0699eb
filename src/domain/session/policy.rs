//! What to do when stream availability is never confirmed.

use serde::{Deserialize, Serialize};

/// Behaviour once the availability polling deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityPolicy {
    /// Go active anyway; players usually recover once segments appear.
    AssumeAvailable,
    /// Fail the start.
    RequireConfirmation,
}

impl Default for AvailabilityPolicy {
    fn default() -> Self {
        AvailabilityPolicy::AssumeAvailable
    }
}
