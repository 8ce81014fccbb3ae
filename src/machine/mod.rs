//! Machine instances and the transition executor.
//!
//! Every variant drives the same executor and differs only in how it
//! serializes callers:
//!
//! - [`StateMachine`]: synchronous callbacks, re-entrant or concurrent calls
//!   fail fast with [`TransitionError::InTransition`]
//! - [`BlockingStateMachine`]: synchronous callbacks, callers from other
//!   threads block on a mutex
//! - [`AwaitableStateMachine`]: async callbacks, fail-fast exclusion guard
//! - [`QueuedStateMachine`]: async callbacks, contending calls are queued and
//!   run in FIFO order
//! - [`ScheduledStateMachine`]: async callbacks, every call is marshaled onto
//!   a [`Scheduler`]

/// Inherent accessors shared by every machine variant.
///
/// The variant must provide `fn executor(&self) -> &Executor<S, T>`.
macro_rules! machine_accessors {
    ($machine:ident) => {
        impl<S: $crate::core::State, T: $crate::core::Trigger> $machine<S, T> {
            /// Identifier attached to this machine's log records.
            pub fn id(&self) -> $crate::machine::MachineId {
                self.executor().id()
            }

            pub fn name(&self) -> Option<&str> {
                self.executor().name()
            }

            pub fn current_state(&self) -> S {
                self.executor().current_state()
            }

            pub fn is_in_state(&self, state: &S) -> bool {
                self.executor().current_state() == *state
            }

            pub fn is_enabled(&self) -> bool {
                self.executor().is_enabled()
            }

            /// Disable the machine. Later requests become no-ops; a transition
            /// already past its enabled check runs to completion.
            pub fn pause(&self) {
                self.executor().set_enabled(false);
            }

            pub fn resume(&self) {
                self.executor().set_enabled(true);
            }

            /// Triggers configured for the current state. Guards are not
            /// evaluated.
            pub fn permitted_triggers(&self) -> Vec<T> {
                self.executor().permitted_triggers()
            }

            /// Snapshot of the transition history, if tracking is enabled.
            pub fn history(&self) -> Option<$crate::core::StateHistory<S, T>> {
                self.executor().history()
            }

            pub fn on_transition_started<F>(&self, listener: F)
            where
                F: Fn(&$crate::machine::TransitionEvent<S, T>) + Send + Sync + 'static,
            {
                self.executor()
                    .hooks()
                    .add_started(std::sync::Arc::new(listener));
            }

            pub fn on_transition_executed<F>(&self, listener: F)
            where
                F: Fn(&$crate::machine::TransitionEvent<S, T>) + Send + Sync + 'static,
            {
                self.executor()
                    .hooks()
                    .add_executed(std::sync::Arc::new(listener));
            }

            /// Route rejected triggers to `handler` instead of returning
            /// [`TransitionError::InvalidTrigger`](crate::machine::TransitionError::InvalidTrigger).
            pub fn on_unhandled_trigger<F>(&self, handler: F)
            where
                F: Fn(&$crate::machine::UnhandledTrigger<S, T>) + Send + Sync + 'static,
            {
                self.executor()
                    .hooks()
                    .set_unhandled(std::sync::Arc::new(handler));
            }

            /// Route unknown target states to `handler` instead of returning
            /// [`TransitionError::InvalidState`](crate::machine::TransitionError::InvalidState).
            pub fn on_invalid_state<F>(&self, handler: F)
            where
                F: Fn(&$crate::machine::InvalidState<S, T>) + Send + Sync + 'static,
            {
                self.executor()
                    .hooks()
                    .set_invalid_state(std::sync::Arc::new(handler));
            }
        }
    };
}

mod awaitable;
mod blocking;
mod error;
mod events;
mod executor;
mod guard;
mod queued;
mod scheduled;
mod sync;

pub use awaitable::AwaitableStateMachine;
pub use blocking::BlockingStateMachine;
pub use error::{Rejection, TransitionError};
pub use events::{InvalidState, TransitionEvent, UnhandledTrigger};
pub use executor::{MachineId, MoveOptions};
pub use queued::{PendingTransition, QueuedStateMachine};
pub use scheduled::{Scheduler, ScheduledStateMachine, TokioScheduler, WorkerScheduler};
pub use sync::StateMachine;

pub(crate) use events::Hooks;
pub(crate) use executor::{Executor, ExecutorOptions};
