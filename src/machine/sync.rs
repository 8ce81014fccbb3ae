//! Synchronous machine with a fail-fast exclusion guard.

use super::executor::{Executor, MoveOptions, Request};
use super::guard::TransitionGuard;
use super::TransitionError;
use crate::builder::{Configuration, ConfigurationError, MachineBuilder};
use crate::core::{ParameterizedTrigger, State, Trigger};
use std::any::Any;

/// Machine whose callbacks are plain functions run inline.
///
/// The machine is `Sync`; share it with `Arc`. A trigger fired while another
/// transition is in flight (for example from inside a callback) fails with
/// [`TransitionError::InTransition`] unless the machine has been paused.
///
/// # Example
///
/// ```rust
/// use liquid_fsm::builder::Configuration;
/// use liquid_fsm::machine::StateMachine;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Light { Off, On }
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Switch { Flip }
///
/// let mut config = Configuration::new();
/// config.configure(Light::Off).permit(Switch::Flip, Light::On)?;
/// config.configure(Light::On).permit(Switch::Flip, Light::Off)?;
///
/// let machine = StateMachine::new(config, Light::Off)?;
/// machine.fire(Switch::Flip)?;
/// assert_eq!(machine.current_state(), Light::On);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct StateMachine<S, T> {
    executor: Executor<S, T>,
    guard: TransitionGuard,
}

impl<S: State, T: Trigger> StateMachine<S, T> {
    /// Create a machine starting in `initial`.
    pub fn new(configuration: Configuration<S, T>, initial: S) -> Result<Self, ConfigurationError> {
        MachineBuilder::new(configuration).initial(initial).build()
    }

    pub(crate) fn from_executor(executor: Executor<S, T>) -> Self {
        Self {
            executor,
            guard: TransitionGuard::new(),
        }
    }

    pub fn fire(&self, trigger: T) -> Result<(), TransitionError> {
        self.guarded(Request::fire(trigger))
    }

    pub fn fire_with<A: Any + Send>(
        &self,
        trigger: &ParameterizedTrigger<T, A>,
        argument: A,
    ) -> Result<(), TransitionError> {
        self.guarded(Request::fire_with(trigger.trigger().clone(), argument))
    }

    /// Move to `state` without a trigger, running the callbacks selected by
    /// `options`.
    pub fn move_to_state(&self, state: S, options: MoveOptions) -> Result<(), TransitionError> {
        self.guarded(Request::move_to(state, options))
    }

    /// Whether `trigger` would currently be accepted. Evaluates guards.
    pub fn can_handle(&self, trigger: &T) -> bool {
        self.executor.can_handle_inline(trigger)
    }

    pub fn is_in_transition(&self) -> bool {
        self.guard.is_held()
    }

    fn guarded(&self, request: Request<S, T>) -> Result<(), TransitionError> {
        let Some(_token) = self.guard.try_acquire() else {
            return if self.executor.is_enabled() {
                Err(TransitionError::InTransition)
            } else {
                Ok(())
            };
        };
        self.executor.execute_inline(request)
    }

    fn executor(&self) -> &Executor<S, T> {
        &self.executor
    }
}

machine_accessors!(StateMachine);
