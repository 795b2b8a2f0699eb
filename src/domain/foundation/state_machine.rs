//! State machine trait for phase enums.
//!
//! Provides a consistent interface for validating and performing state
//! transitions across the lifecycle enums of the crate (session phase,
//! event bus connection state).

use super::ValidationError;

/// Trait for enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for SessionPhase {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Idle, Diagnosing) | (Diagnosing, StartingRelay) /* ... */)
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Idle => vec![Idle, Diagnosing],
///             // ... etc
///         }
///     }
/// }
///
/// let next = phase.transition_to(SessionPhase::StartingRelay)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestLink {
        Down,
        Dialing,
        Up,
        Retired,
    }

    impl StateMachine for TestLink {
        fn can_transition_to(&self, target: &Self) -> bool {
            use TestLink::*;
            matches!(
                (self, target),
                (Down, Dialing) | (Dialing, Up) | (Dialing, Down) | (Up, Down) | (Down, Retired)
            )
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use TestLink::*;
            match self {
                Down => vec![Dialing, Retired],
                Dialing => vec![Up, Down],
                Up => vec![Down],
                Retired => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        assert_eq!(TestLink::Down.transition_to(TestLink::Dialing), Ok(TestLink::Dialing));
    }

    #[test]
    fn transition_to_fails_for_invalid_transition() {
        assert!(TestLink::Down.transition_to(TestLink::Up).is_err());
    }

    #[test]
    fn is_terminal_only_for_states_without_exits() {
        assert!(TestLink::Retired.is_terminal());
        assert!(!TestLink::Up.is_terminal());
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for state in [TestLink::Down, TestLink::Dialing, TestLink::Up, TestLink::Retired] {
            for target in state.valid_transitions() {
                assert!(
                    state.can_transition_to(&target),
                    "{:?} -> {:?} should be allowed",
                    state,
                    target
                );
            }
        }
    }
}
