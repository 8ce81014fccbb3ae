//! Bounds for state and trigger values.
//!
//! A machine is generic over the caller's own state and trigger types. Any
//! value that can be compared, hashed, cloned and shared between threads
//! qualifies; both traits are implemented automatically.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state machine states.
///
/// States are plain values identifying a position in the machine. They are
/// used as keys of the configuration table, so they must be `Eq + Hash`.
///
/// # Example
///
/// ```rust
/// use liquid_fsm::core::State;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Phone {
///     Off,
///     Ringing,
/// }
///
/// fn assert_state<S: State>(_: S) {}
/// assert_state(Phone::Off);
/// ```
pub trait State: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> State for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Trait for state machine triggers.
///
/// A trigger is the stimulus naming which transition to attempt from the
/// current state.
pub trait Trigger: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Trigger for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        Initial,
        Complete,
    }

    fn is_state<S: State>(_: &S) -> bool {
        true
    }

    fn is_trigger<T: Trigger>(_: &T) -> bool {
        true
    }

    #[test]
    fn enums_are_states() {
        assert!(is_state(&TestState::Initial));
        assert!(is_state(&TestState::Complete));
    }

    #[test]
    fn strings_and_integers_qualify() {
        assert!(is_state(&"idle".to_string()));
        assert!(is_trigger(&42u32));
        assert!(is_trigger(&"go"));
    }
}
