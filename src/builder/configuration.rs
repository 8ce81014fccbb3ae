//! The state table and its per-state configuration handle.

use crate::builder::error::ConfigurationError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{
    Action, Callback, CallbackOutput, DynamicTarget, Guard, ParameterizedTrigger, State,
    StateRepresentation, Target, Trigger, TriggerRepresentation,
};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;

/// Table of configured states, built before any machine is created.
///
/// States are added lazily: configuring a state, or naming it as a fixed
/// transition target, creates its record. Machines take ownership of the
/// table, so it cannot change while triggers fire.
///
/// # Example
///
/// ```rust
/// use liquid_fsm::builder::Configuration;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Phone { Off, Ringing }
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Call { Ring, TurnOff }
///
/// let mut config = Configuration::new();
/// config
///     .configure(Phone::Off)
///     .on_entry(|| println!("phone off"))
///     .permit(Call::Ring, Phone::Ringing)?
///     .permit_reentry(Call::TurnOff)?;
///
/// assert!(config.contains(&Phone::Ringing));
/// # Ok::<(), liquid_fsm::builder::ConfigurationError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Configuration<S, T> {
    states: HashMap<S, StateRepresentation<S, T>>,
    first: Option<S>,
}

impl<S: State, T: Trigger> Configuration<S, T> {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            first: None,
        }
    }

    /// Get the configuration handle for `state`, creating its record.
    pub fn configure(&mut self, state: S) -> StateConfiguration<'_, S, T> {
        self.ensure(&state);
        StateConfiguration {
            config: self,
            state,
        }
    }

    pub fn contains(&self, state: &S) -> bool {
        self.states.contains_key(state)
    }

    pub fn get(&self, state: &S) -> Option<&StateRepresentation<S, T>> {
        self.states.get(state)
    }

    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.states.keys()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The first state that was added, used when no valid initial state is
    /// given to a machine.
    pub fn first_state(&self) -> Option<&S> {
        self.first.as_ref()
    }

    /// A state whose callbacks, guards or resolvers are async, if any.
    pub fn find_async_state(&self) -> Option<&S> {
        self.states
            .values()
            .find(|rep| rep.is_async())
            .map(|rep| &rep.state)
    }

    fn ensure(&mut self, state: &S) -> &mut StateRepresentation<S, T> {
        if self.first.is_none() {
            self.first = Some(state.clone());
        }
        self.states
            .entry(state.clone())
            .or_insert_with(|| StateRepresentation::new(state.clone()))
    }
}

impl<S: State, T: Trigger> Default for Configuration<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent handle configuring one state.
///
/// Callback setters overwrite (last write wins). Trigger registrations fail
/// with [`ConfigurationError::ExclusiveOperation`] if the trigger is already
/// configured for this state.
pub struct StateConfiguration<'a, S, T> {
    config: &'a mut Configuration<S, T>,
    state: S,
}

impl<'a, S: State, T: Trigger> StateConfiguration<'a, S, T> {
    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn on_entry<F, R>(&mut self, callback: F) -> &mut Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: CallbackOutput,
    {
        self.representation().on_entry = Some(Callback::new(callback));
        self
    }

    pub fn on_entry_async<F, Fut, R>(&mut self, callback: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: CallbackOutput + 'static,
    {
        self.representation().on_entry = Some(Callback::from_async(callback));
        self
    }

    pub fn on_exit<F, R>(&mut self, callback: F) -> &mut Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: CallbackOutput,
    {
        self.representation().on_exit = Some(Callback::new(callback));
        self
    }

    pub fn on_exit_async<F, Fut, R>(&mut self, callback: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: CallbackOutput + 'static,
    {
        self.representation().on_exit = Some(Callback::from_async(callback));
        self
    }

    pub fn permit(&mut self, trigger: T, target: S) -> Result<&mut Self, ConfigurationError> {
        self.add(trigger, None, Target::State(target), Action::None)
    }

    pub fn permit_if(
        &mut self,
        trigger: T,
        target: S,
        guard: Guard,
    ) -> Result<&mut Self, ConfigurationError> {
        self.add(trigger, Some(guard), Target::State(target), Action::None)
    }

    pub fn permit_reentry(&mut self, trigger: T) -> Result<&mut Self, ConfigurationError> {
        let target = self.state.clone();
        self.permit(trigger, target)
    }

    pub fn permit_reentry_if(
        &mut self,
        trigger: T,
        guard: Guard,
    ) -> Result<&mut Self, ConfigurationError> {
        let target = self.state.clone();
        self.permit_if(trigger, target, guard)
    }

    pub fn ignore(&mut self, trigger: T) -> Result<&mut Self, ConfigurationError> {
        self.add(trigger, None, Target::Ignore, Action::None)
    }

    pub fn ignore_if(&mut self, trigger: T, guard: Guard) -> Result<&mut Self, ConfigurationError> {
        self.add(trigger, Some(guard), Target::Ignore, Action::None)
    }

    pub fn permit_dynamic(
        &mut self,
        trigger: T,
        resolver: DynamicTarget<S>,
    ) -> Result<&mut Self, ConfigurationError> {
        self.add(trigger, None, Target::Dynamic(resolver), Action::None)
    }

    /// Permit a parameterized trigger whose action receives the argument.
    pub fn permit_parameterized<A, F, R>(
        &mut self,
        trigger: &ParameterizedTrigger<T, A>,
        target: S,
        action: F,
    ) -> Result<&mut Self, ConfigurationError>
    where
        A: Any + Send,
        F: Fn(A) -> R + Send + Sync + 'static,
        R: CallbackOutput,
    {
        self.transition(
            TransitionBuilder::parameterized(trigger)
                .to(target)
                .with_arg(action),
        )
    }

    /// Register a trigger built with [`TransitionBuilder`].
    pub fn transition<A>(
        &mut self,
        builder: TransitionBuilder<S, T, A>,
    ) -> Result<&mut Self, ConfigurationError>
    where
        A: Any + Send,
    {
        let rep = builder.build(&self.state)?;
        self.insert(rep)
    }

    fn add(
        &mut self,
        trigger: T,
        guard: Option<Guard>,
        target: Target<S>,
        action: Action,
    ) -> Result<&mut Self, ConfigurationError> {
        self.insert(TriggerRepresentation {
            trigger,
            guard,
            target,
            argument: None,
            action,
        })
    }

    fn insert(&mut self, rep: TriggerRepresentation<S, T>) -> Result<&mut Self, ConfigurationError> {
        if self.representation().find_trigger(&rep.trigger).is_some() {
            return Err(ConfigurationError::ExclusiveOperation {
                state: format!("{:?}", self.state),
                trigger: format!("{:?}", rep.trigger),
            });
        }
        if let Target::State(target) = &rep.target {
            self.config.ensure(target);
        }
        self.representation().triggers.push(rep);
        Ok(self)
    }

    fn representation(&mut self) -> &mut StateRepresentation<S, T> {
        self.config.ensure(&self.state)
    }
}
