//! Startup protocol phases of a live session.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Where the orchestrator is in the startup/teardown protocol.
///
/// ```text
/// Idle → Diagnosing → StartingRelay → PollingAvailability → Active
///            └──────────────┴──────────────────┴──→ Failed
/// any ──stop()──→ Idle
/// Failed ──start()──→ Diagnosing
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Diagnosing,
    StartingRelay,
    PollingAvailability,
    Active,
    Failed,
}

impl SessionPhase {
    /// True while a startup protocol is running.
    pub fn is_starting(&self) -> bool {
        matches!(
            self,
            SessionPhase::Diagnosing | SessionPhase::StartingRelay | SessionPhase::PollingAvailability
        )
    }
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Idle
    }
}

impl StateMachine for SessionPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionPhase::*;
        matches!(
            (self, target),
            (_, Idle)
                | (Idle, Diagnosing)
                | (Failed, Diagnosing)
                | (Diagnosing, StartingRelay)
                | (StartingRelay, PollingAvailability)
                | (PollingAvailability, Active)
                | (Diagnosing, Failed)
                | (StartingRelay, Failed)
                | (PollingAvailability, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionPhase::*;
        match self {
            Idle => vec![Idle, Diagnosing],
            Diagnosing => vec![Idle, StartingRelay, Failed],
            StartingRelay => vec![Idle, PollingAvailability, Failed],
            PollingAvailability => vec![Idle, Active, Failed],
            Active => vec![Idle],
            Failed => vec![Idle, Diagnosing],
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Diagnosing => "diagnosing",
            SessionPhase::StartingRelay => "starting_relay",
            SessionPhase::PollingAvailability => "polling_availability",
            SessionPhase::Active => "active",
            SessionPhase::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}
