//! Asynchronous machine guarded against overlapping transitions.

use super::executor::{Executor, MoveOptions, Request};
use super::guard::TransitionGuard;
use super::TransitionError;
use crate::builder::{Configuration, ConfigurationError, MachineBuilder};
use crate::core::{ParameterizedTrigger, State, Trigger};
use std::any::Any;

/// Machine whose callbacks may be async.
///
/// The steps of one transition run strictly in sequence. A call made while a
/// transition is in flight, including a re-entrant call from a callback,
/// fails with [`TransitionError::InTransition`] rather than waiting; use
/// [`QueuedStateMachine`](super::QueuedStateMachine) to serialize callers.
///
/// # Example
///
/// ```rust
/// use liquid_fsm::builder::Configuration;
/// use liquid_fsm::machine::AwaitableStateMachine;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Job { Idle, Running }
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Cmd { Start }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Configuration::new();
/// config
///     .configure(Job::Running)
///     .on_entry_async(|| async { tokio::task::yield_now().await });
/// config.configure(Job::Idle).permit(Cmd::Start, Job::Running)?;
///
/// let machine = AwaitableStateMachine::new(config, Job::Idle)?;
/// machine.fire(Cmd::Start).await?;
/// assert_eq!(machine.current_state(), Job::Running);
/// # Ok(())
/// # }
/// ```
pub struct AwaitableStateMachine<S, T> {
    executor: Executor<S, T>,
    guard: TransitionGuard,
}

impl<S: State, T: Trigger> AwaitableStateMachine<S, T> {
    pub fn new(configuration: Configuration<S, T>, initial: S) -> Result<Self, ConfigurationError> {
        MachineBuilder::new(configuration)
            .initial(initial)
            .build_awaitable()
    }

    pub(crate) fn from_executor(executor: Executor<S, T>) -> Self {
        Self {
            executor,
            guard: TransitionGuard::new(),
        }
    }

    pub async fn fire(&self, trigger: T) -> Result<(), TransitionError> {
        self.guarded(Request::fire(trigger)).await
    }

    pub async fn fire_with<A: Any + Send>(
        &self,
        trigger: &ParameterizedTrigger<T, A>,
        argument: A,
    ) -> Result<(), TransitionError> {
        self.guarded(Request::fire_with(trigger.trigger().clone(), argument))
            .await
    }

    pub async fn move_to_state(&self, state: S, options: MoveOptions) -> Result<(), TransitionError> {
        self.guarded(Request::move_to(state, options)).await
    }

    /// Whether `trigger` would currently be accepted. Evaluates guards and
    /// dynamic resolvers.
    pub async fn can_handle(&self, trigger: &T) -> bool {
        self.executor.can_handle(trigger).await
    }

    pub fn is_in_transition(&self) -> bool {
        self.guard.is_held()
    }

    pub(crate) async fn guarded(&self, request: Request<S, T>) -> Result<(), TransitionError> {
        let Some(_token) = self.guard.try_acquire() else {
            return if self.executor.is_enabled() {
                Err(TransitionError::InTransition)
            } else {
                Ok(())
            };
        };
        self.executor.execute(request).await
    }

    pub(crate) fn executor(&self) -> &Executor<S, T> {
        &self.executor
    }
}

machine_accessors!(AwaitableStateMachine);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransitionBuilder;
    use crate::core::{DynamicState, DynamicTarget};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Job {
        Idle,
        Running,
        Done,
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Cmd {
        Start,
        Finish,
        Route,
    }

    #[tokio::test]
    async fn async_callbacks_run_in_sequence() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (exit_log, action_log, entry_log) = (log.clone(), log.clone(), log.clone());

        let mut config = Configuration::new();
        config
            .configure(Job::Idle)
            .on_exit_async(move || {
                let log = exit_log.clone();
                async move {
                    tokio::task::yield_now().await;
                    log.lock().unwrap().push("exit");
                }
            })
            .transition(
                TransitionBuilder::new(Cmd::Start)
                    .to(Job::Running)
                    .action_async(move || {
                        let log = action_log.clone();
                        async move { log.lock().unwrap().push("action") }
                    }),
            )
            .unwrap();
        config.configure(Job::Running).on_entry(move || entry_log.lock().unwrap().push("entry"));

        let machine = AwaitableStateMachine::new(config, Job::Idle).unwrap();
        machine.fire(Cmd::Start).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["exit", "action", "entry"]);
        assert_eq!(machine.current_state(), Job::Running);
    }

    #[tokio::test]
    async fn overlapping_fire_fails_fast() {
        let release = Arc::new(Notify::new());
        let gate = Arc::clone(&release);

        let mut config = Configuration::new();
        config.configure(Job::Idle).permit(Cmd::Start, Job::Running).unwrap();
        config.configure(Job::Running).on_entry_async(move || {
            let gate = Arc::clone(&gate);
            async move { gate.notified().await }
        });
        config.configure(Job::Running).permit(Cmd::Finish, Job::Done).unwrap();

        let machine = Arc::new(AwaitableStateMachine::new(config, Job::Idle).unwrap());
        let first = tokio::spawn({
            let machine = Arc::clone(&machine);
            async move { machine.fire(Cmd::Start).await }
        });

        while !machine.is_in_transition() {
            tokio::task::yield_now().await;
        }
        let second = machine.fire(Cmd::Finish).await;
        assert!(matches!(second, Err(TransitionError::InTransition)));

        release.notify_one();
        first.await.unwrap().unwrap();
        assert!(!machine.is_in_transition());
        assert_eq!(machine.current_state(), Job::Running);
    }

    #[tokio::test]
    async fn failing_callback_releases_guard_and_keeps_state() {
        #[derive(Debug, thiserror::Error)]
        #[error("boom")]
        struct Boom;

        let mut config = Configuration::new();
        config.configure(Job::Idle).permit(Cmd::Start, Job::Running).unwrap();
        config
            .configure(Job::Running)
            .on_entry_async(|| async { Err::<(), _>(Boom) });

        let machine = AwaitableStateMachine::new(config, Job::Idle).unwrap();
        let err = machine.fire(Cmd::Start).await.unwrap_err();

        assert!(matches!(err, TransitionError::Callback(_)));
        assert_eq!(machine.current_state(), Job::Idle);
        assert!(!machine.is_in_transition());
    }

    #[tokio::test]
    async fn async_dynamic_target_rejection_is_unhandled() {
        let mut config = Configuration::new();
        config
            .configure(Job::Idle)
            .permit_dynamic(
                Cmd::Route,
                DynamicTarget::from_async(|| async { DynamicState::rejected(Job::Done) }),
            )
            .unwrap();
        config.configure(Job::Done);

        let machine = AwaitableStateMachine::new(config, Job::Idle).unwrap();
        let unhandled = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&unhandled);
        machine.on_unhandled_trigger(move |event| sink.lock().unwrap().push(event.reason));

        assert!(!machine.can_handle(&Cmd::Route).await);
        machine.fire(Cmd::Route).await.unwrap();

        assert_eq!(
            *unhandled.lock().unwrap(),
            vec![crate::machine::Rejection::DynamicRejected]
        );
        assert_eq!(machine.current_state(), Job::Idle);
    }
}
