//! Event bus connection lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Connection state of the event bus client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusState {
    Disconnected,
    Connecting,
    Connected,
    /// Reconnection cap exceeded; only an explicit `connect` leaves this.
    Unreachable,
}

impl BusState {
    pub fn is_connected(&self) -> bool {
        matches!(self, BusState::Connected)
    }
}

impl Default for BusState {
    fn default() -> Self {
        BusState::Disconnected
    }
}

impl StateMachine for BusState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use BusState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connecting, Unreachable)
                | (Connected, Disconnected)
                | (Connected, Connecting)
                | (Disconnected, Unreachable)
                | (Unreachable, Connecting)
                | (Unreachable, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use BusState::*;
        match self {
            Disconnected => vec![Connecting, Unreachable],
            Connecting => vec![Connected, Disconnected, Unreachable],
            Connected => vec![Disconnected, Connecting],
            Unreachable => vec![Connecting, Disconnected],
        }
    }

}

impl fmt::Display for BusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BusState::Disconnected => "disconnected",
            BusState::Connecting => "connecting",
            BusState::Connected => "connected",
            BusState::Unreachable => "unreachable",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_can_drop_back_to_connecting() {
        assert!(BusState::Connected.can_transition_to(&BusState::Connecting));
        assert!(BusState::Connected.can_transition_to(&BusState::Disconnected));
    }

    #[test]
    fn connected_cannot_jump_to_unreachable() {
        assert!(BusState::Connected
            .transition_to(BusState::Unreachable)
            .is_err());
    }

    #[test]
    fn unreachable_is_left_only_by_reconnect_or_teardown() {
        assert_eq!(
            BusState::Unreachable.valid_transitions(),
            vec![BusState::Connecting, BusState::Disconnected]
        );
    }
}
