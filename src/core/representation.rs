//! Per-state and per-trigger records of the configuration table.

use super::action::{Action, ArgumentType, Callback};
use super::dynamic::DynamicTarget;
use super::guard::Guard;

/// Where a trigger leads.
#[derive(Clone, Debug)]
pub enum Target<S> {
    /// Fixed next state.
    State(S),
    /// Legal no-op: nothing runs and the state does not change.
    Ignore,
    /// Next state resolved at fire time.
    Dynamic(DynamicTarget<S>),
}

/// A trigger configured for one state.
#[derive(Clone, Debug)]
pub struct TriggerRepresentation<S, T> {
    pub trigger: T,
    pub guard: Option<Guard>,
    pub target: Target<S>,
    /// Argument type the trigger was registered with, `None` for plain
    /// triggers.
    pub argument: Option<ArgumentType>,
    pub action: Action,
}

impl<S, T> TriggerRepresentation<S, T> {
    pub fn is_ignored(&self) -> bool {
        matches!(self.target, Target::Ignore)
    }

    /// Whether any part of this record needs an executor to run.
    pub fn is_async(&self) -> bool {
        self.guard.as_ref().is_some_and(Guard::is_async)
            || matches!(&self.target, Target::Dynamic(resolver) if resolver.is_async())
            || self.action.is_async()
    }
}

/// A configured state with its callbacks and triggers.
#[derive(Clone, Debug)]
pub struct StateRepresentation<S, T> {
    pub state: S,
    pub on_entry: Option<Callback>,
    pub on_exit: Option<Callback>,
    pub triggers: Vec<TriggerRepresentation<S, T>>,
}

impl<S, T: PartialEq> StateRepresentation<S, T> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            on_entry: None,
            on_exit: None,
            triggers: Vec::new(),
        }
    }

    pub fn find_trigger(&self, trigger: &T) -> Option<&TriggerRepresentation<S, T>> {
        self.triggers.iter().find(|rep| rep.trigger == *trigger)
    }

    pub fn is_async(&self) -> bool {
        self.on_entry.as_ref().is_some_and(Callback::is_async)
            || self.on_exit.as_ref().is_some_and(Callback::is_async)
            || self.triggers.iter().any(TriggerRepresentation::is_async)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_trigger_matches_by_value() {
        let mut rep: StateRepresentation<&str, &str> = StateRepresentation::new("Off");
        rep.triggers.push(TriggerRepresentation {
            trigger: "Ring",
            guard: None,
            target: Target::State("Ringing"),
            argument: None,
            action: Action::None,
        });

        assert!(rep.find_trigger(&"Ring").is_some());
        assert!(rep.find_trigger(&"Talk").is_none());
    }

    #[test]
    fn async_parts_mark_the_state_async() {
        let mut rep: StateRepresentation<&str, &str> = StateRepresentation::new("Off");
        assert!(!rep.is_async());

        rep.triggers.push(TriggerRepresentation {
            trigger: "Ring",
            guard: Some(Guard::from_async(|| async { true })),
            target: Target::Ignore,
            argument: None,
            action: Action::None,
        });

        assert!(rep.triggers[0].is_ignored());
        assert!(rep.is_async());
    }

    #[test]
    fn async_dynamic_target_marks_the_record_async() {
        let rep: TriggerRepresentation<&str, &str> = TriggerRepresentation {
            trigger: "Redial",
            guard: None,
            target: Target::Dynamic(DynamicTarget::from_async(|| async {
                crate::core::DynamicState::new("Ringing")
            })),
            argument: None,
            action: Action::None,
        };

        assert!(rep.is_async());
        assert!(!rep.is_ignored());
    }
}
