//! State transition history tracking.
//!
//! Machines built with `track_history` record every executed transition
//! (fired or forced) into a bounded log, oldest entries dropped first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single executed transition.
///
/// `trigger` is `None` for forced moves made with `move_to_state`.
///
/// # Example
///
/// ```rust
/// use liquid_fsm::core::StateTransition;
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: "Off",
///     to: "Ringing",
///     trigger: Some("Ring"),
///     timestamp: Utc::now(),
/// };
/// assert!(!transition.is_reentry());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition<S, T> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// The trigger that caused the transition
    pub trigger: Option<T>,
    /// When the transition completed
    pub timestamp: DateTime<Utc>,
}

impl<S: PartialEq, T> StateTransition<S, T> {
    pub fn is_reentry(&self) -> bool {
        self.from == self.to
    }
}

/// Ordered, bounded history of executed transitions.
///
/// # Example
///
/// ```rust
/// use liquid_fsm::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_limit(2);
/// for (from, to) in [("A", "B"), ("B", "C"), ("C", "D")] {
///     history.record(StateTransition { from, to, trigger: None::<()>, timestamp: Utc::now() });
/// }
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.get_path(), vec![&"B", &"C", &"D"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory<S, T> {
    limit: usize,
    transitions: VecDeque<StateTransition<S, T>>,
}

impl<S, T> StateHistory<S, T> {
    /// Create an empty history keeping at most `limit` transitions.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            transitions: VecDeque::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Append a transition, evicting the oldest once the limit is reached.
    pub fn record(&mut self, transition: StateTransition<S, T>) {
        if self.limit == 0 {
            return;
        }
        while self.transitions.len() >= self.limit {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Get the path of states traversed.
    ///
    /// Returns the `from` state of the oldest retained transition followed
    /// by the `to` state of each transition.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the oldest and newest retained transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.front(), self.transitions.back()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition<S, T>> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&StateTransition<S, T>> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
