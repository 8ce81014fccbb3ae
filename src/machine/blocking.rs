//! Synchronous machine serialized by an OS mutex.

use super::executor::{Executor, MoveOptions, Request};
use super::TransitionError;
use crate::builder::{Configuration, ConfigurationError, MachineBuilder};
use crate::core::{ParameterizedTrigger, State, Trigger};
use std::any::Any;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};
use tracing::trace;

/// Machine shared between threads; concurrent callers block until the
/// transition in flight completes.
///
/// A callback firing on its own machine would deadlock on the mutex, so the
/// owning thread is tracked and such calls fail with
/// [`TransitionError::InTransition`] instead.
pub struct BlockingStateMachine<S, T> {
    executor: Executor<S, T>,
    lock: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

/// Clears the owner when the transition ends, including by panic.
struct OwnerReset<'a> {
    owner: &'a Mutex<Option<ThreadId>>,
}

impl Drop for OwnerReset<'_> {
    fn drop(&mut self) {
        *self.owner.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<S: State, T: Trigger> BlockingStateMachine<S, T> {
    pub fn new(configuration: Configuration<S, T>, initial: S) -> Result<Self, ConfigurationError> {
        MachineBuilder::new(configuration)
            .initial(initial)
            .build_blocking()
    }

    pub(crate) fn from_executor(executor: Executor<S, T>) -> Self {
        Self {
            executor,
            lock: Mutex::new(()),
            owner: Mutex::new(None),
        }
    }

    pub fn fire(&self, trigger: T) -> Result<(), TransitionError> {
        self.exclusive(Request::fire(trigger))
    }

    pub fn fire_with<A: Any + Send>(
        &self,
        trigger: &ParameterizedTrigger<T, A>,
        argument: A,
    ) -> Result<(), TransitionError> {
        self.exclusive(Request::fire_with(trigger.trigger().clone(), argument))
    }

    pub fn move_to_state(&self, state: S, options: MoveOptions) -> Result<(), TransitionError> {
        self.exclusive(Request::move_to(state, options))
    }

    pub fn can_handle(&self, trigger: &T) -> bool {
        self.executor.can_handle_inline(trigger)
    }

    fn exclusive(&self, request: Request<S, T>) -> Result<(), TransitionError> {
        let me = thread::current().id();
        if *self.owner.lock().unwrap_or_else(PoisonError::into_inner) == Some(me) {
            return if self.executor.is_enabled() {
                Err(TransitionError::InTransition)
            } else {
                Ok(())
            };
        }

        let _lock = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        trace!(machine = %self.executor.id(), "blocking lock acquired");
        *self.owner.lock().unwrap_or_else(PoisonError::into_inner) = Some(me);
        let _reset = OwnerReset { owner: &self.owner };

        self.executor.execute_inline(request)
    }

    fn executor(&self) -> &Executor<S, T> {
        &self.executor
    }
}

machine_accessors!(BlockingStateMachine);
