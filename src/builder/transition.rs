//! Builder for trigger records with an optional guard and action.

use crate::builder::error::ConfigurationError;
use crate::core::{
    Action, ArgumentType, CallbackOutput, DynamicTarget, Guard, ParameterizedTrigger, State, Target, Trigger,
    TriggerRepresentation,
};
use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;

enum PendingTarget<S> {
    State(S),
    Reentry,
    Ignore,
    Dynamic(DynamicTarget<S>),
}

/// Builder for a single trigger of a state, used when a transition needs an
/// action or an argument.
///
/// `A` is the argument type of a parameterized trigger, `()` otherwise.
///
/// # Example
///
/// ```rust
/// use liquid_fsm::builder::{Configuration, TransitionBuilder};
/// use liquid_fsm::core::ParameterizedTrigger;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Phone { Ringing, Connected }
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Call { Connect }
///
/// let connect = ParameterizedTrigger::<_, String>::new(Call::Connect);
/// let mut config = Configuration::new();
/// config
///     .configure(Phone::Ringing)
///     .transition(
///         TransitionBuilder::parameterized(&connect)
///             .to(Phone::Connected)
///             .with_arg(|name: String| println!("connected to {name}")),
///     )
///     .unwrap();
/// ```
pub struct TransitionBuilder<S, T, A = ()> {
    trigger: T,
    target: Option<PendingTarget<S>>,
    guard: Option<Guard>,
    argument: Option<ArgumentType>,
    action: Action,
    _argument: PhantomData<fn(A)>,
}

impl<S: State, T: Trigger> TransitionBuilder<S, T, ()> {
    /// Start a transition for a plain trigger.
    pub fn new(trigger: T) -> Self {
        Self {
            trigger,
            target: None,
            guard: None,
            argument: None,
            action: Action::None,
            _argument: PhantomData,
        }
    }
}

impl<S: State, T: Trigger, A: Any + Send> TransitionBuilder<S, T, A> {
    /// Start a transition for a trigger carrying an argument of type `A`.
    pub fn parameterized(trigger: &ParameterizedTrigger<T, A>) -> Self {
        Self {
            trigger: trigger.trigger().clone(),
            target: None,
            guard: None,
            argument: Some(ArgumentType::of::<A>()),
            action: Action::None,
            _argument: PhantomData,
        }
    }

    /// Fixed target state.
    pub fn to(mut self, state: S) -> Self {
        self.target = Some(PendingTarget::State(state));
        self
    }

    /// Target the state being configured.
    pub fn reentry(mut self) -> Self {
        self.target = Some(PendingTarget::Reentry);
        self
    }

    /// Make the trigger a legal no-op.
    pub fn ignore(mut self) -> Self {
        self.target = Some(PendingTarget::Ignore);
        self
    }

    /// Resolve the target when the trigger fires.
    pub fn dynamic(mut self, resolver: DynamicTarget<S>) -> Self {
        self.target = Some(PendingTarget::Dynamic(resolver));
        self
    }

    /// Add a guard (optional).
    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(predicate))
    }

    /// Add a guard using a closure returning a future (optional).
    pub fn when_async<F, Fut>(self, predicate: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.guard(Guard::from_async(predicate))
    }

    /// Set the action from a pre-built [`Action`].
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Nullary action.
    pub fn action<F, R>(self, action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: CallbackOutput,
    {
        self.with_action(Action::new(action))
    }

    pub fn action_async<F, Fut, R>(self, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: CallbackOutput + 'static,
    {
        self.with_action(Action::from_async(action))
    }

    /// Action receiving the trigger's argument.
    pub fn with_arg<F, R>(self, action: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        R: CallbackOutput,
    {
        self.with_action(Action::with_arg(action))
    }

    pub fn with_arg_async<F, Fut, R>(self, action: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: CallbackOutput + 'static,
    {
        self.with_action(Action::with_arg_async(action))
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// Build the trigger record for `source`, the state being configured.
    pub fn build(self, source: &S) -> Result<TriggerRepresentation<S, T>, ConfigurationError> {
        let target = match self.target {
            Some(PendingTarget::State(state)) => Target::State(state),
            Some(PendingTarget::Reentry) => Target::State(source.clone()),
            Some(PendingTarget::Ignore) => Target::Ignore,
            Some(PendingTarget::Dynamic(resolver)) => Target::Dynamic(resolver),
            None => {
                return Err(ConfigurationError::MissingTarget {
                    trigger: format!("{:?}", self.trigger),
                })
            }
        };

        Ok(TriggerRepresentation {
            trigger: self.trigger,
            guard: self.guard,
            target,
            argument: self.argument.or_else(|| self.action.argument_type()),
            action: self.action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        Idle,
        Busy,
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum TestTrigger {
        Start,
        Resize,
    }

    #[test]
    fn builder_validates_missing_target() {
        let result = TransitionBuilder::<TestState, _>::new(TestTrigger::Start).build(&TestState::Idle);

        assert!(matches!(result, Err(ConfigurationError::MissingTarget { .. })));
    }

    #[test]
    fn reentry_targets_the_source_state() {
        let rep = TransitionBuilder::new(TestTrigger::Start)
            .reentry()
            .build(&TestState::Busy)
            .unwrap();

        assert!(matches!(rep.target, Target::State(TestState::Busy)));
    }

    #[test]
    fn fluent_api_builds_guarded_transition() {
        let rep = TransitionBuilder::new(TestTrigger::Start)
            .to(TestState::Busy)
            .when(|| true)
            .action(|| ())
            .build(&TestState::Idle)
            .unwrap();

        assert_eq!(rep.trigger, TestTrigger::Start);
        assert!(rep.guard.is_some());
        assert!(!rep.action.is_none());
        assert!(!rep.is_async());
    }

    #[test]
    fn parameterized_builder_types_the_action() {
        let resize = ParameterizedTrigger::<_, (u16, u16)>::new(TestTrigger::Resize);
        let rep = TransitionBuilder::parameterized(&resize)
            .to(TestState::Busy)
            .with_arg(|(_w, _h): (u16, u16)| ())
            .build(&TestState::Idle)
            .unwrap();

        assert_eq!(
            rep.action.argument_type().map(|ty| ty.name()),
            Some(std::any::type_name::<(u16, u16)>())
        );
    }

    #[test]
    fn async_guard_marks_record_async() {
        let rep = TransitionBuilder::new(TestTrigger::Start)
            .ignore()
            .when_async(|| async { false })
            .build(&TestState::Idle)
            .unwrap();

        assert!(rep.is_ignored());
        assert!(rep.is_async());
    }
}
