//! Errors raised while firing triggers or moving between states.

use crate::core::CallbackError;
use std::fmt;

/// Why a trigger was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// No record for the trigger in the current state.
    NotConfigured,
    /// The record's guard returned false.
    GuardRejected,
    /// A dynamic resolver returned `can_transition == false`.
    DynamicRejected,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotConfigured => f.write_str("not configured"),
            Rejection::GuardRejected => f.write_str("guard rejected"),
            Rejection::DynamicRejected => f.write_str("dynamic target rejected"),
        }
    }
}

/// Errors that can occur during transitions.
///
/// A failed transition never commits: the current state stays what it was
/// before the failing step. Callbacks that already ran are not undone.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("Trigger {trigger} is not valid from state {state} ({reason})")]
    InvalidTrigger {
        state: String,
        trigger: String,
        reason: Rejection,
    },

    #[error("State {state} is not configured")]
    InvalidState { state: String },

    #[error("Trigger {trigger} expects {expected} but was fired with {found}")]
    InvalidTriggerParameter {
        trigger: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Cannot fire while a transition is in progress")]
    InTransition,

    #[error("Transition callback failed: {0}")]
    Callback(#[source] CallbackError),

    #[error("Transition request was cancelled before it ran")]
    Cancelled,

    #[error("A synchronous machine reached a callback that suspended")]
    Suspended,
}

impl TransitionError {
    pub fn is_invalid_trigger(&self) -> bool {
        matches!(self, TransitionError::InvalidTrigger { .. })
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            TransitionError::InvalidTrigger { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
