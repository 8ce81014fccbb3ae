//! Builder for machine instances.

use crate::builder::configuration::Configuration;
use crate::builder::error::ConfigurationError;
use crate::core::{State, Trigger};
use crate::machine::{
    AwaitableStateMachine, BlockingStateMachine, Executor, ExecutorOptions, Hooks, InvalidState,
    QueuedStateMachine, ScheduledStateMachine, Scheduler, StateMachine, TransitionEvent,
    UnhandledTrigger,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Creates a machine from a finished [`Configuration`].
///
/// The configuration is moved into the machine and can no longer change.
/// Listeners registered here are in place before the first transition.
///
/// # Example
///
/// ```rust
/// use liquid_fsm::builder::{Configuration, MachineBuilder};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Door { Open, Closed }
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Push { Close }
///
/// let mut config = Configuration::new();
/// config.configure(Door::Open).permit(Push::Close, Door::Closed)?;
///
/// let machine = MachineBuilder::new(config)
///     .initial(Door::Open)
///     .name("front-door")
///     .track_history(16)
///     .build()?;
/// machine.fire(Push::Close)?;
/// assert_eq!(machine.history().map(|h| h.len()), Some(1));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MachineBuilder<S, T> {
    configuration: Configuration<S, T>,
    initial: Option<S>,
    name: Option<String>,
    history_limit: Option<usize>,
    hooks: Hooks<S, T>,
}

impl<S: State, T: Trigger> MachineBuilder<S, T> {
    pub fn new(configuration: Configuration<S, T>) -> Self {
        Self {
            configuration,
            initial: None,
            name: None,
            history_limit: None,
            hooks: Hooks::new(),
        }
    }

    /// Starting state. Without one, or if it is not configured, the machine
    /// starts in the first state that was configured.
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Name attached to log records.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Keep the last `limit` transitions.
    pub fn track_history(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn on_transition_started<F>(self, listener: F) -> Self
    where
        F: Fn(&TransitionEvent<S, T>) + Send + Sync + 'static,
    {
        self.hooks.add_started(Arc::new(listener));
        self
    }

    pub fn on_transition_executed<F>(self, listener: F) -> Self
    where
        F: Fn(&TransitionEvent<S, T>) + Send + Sync + 'static,
    {
        self.hooks.add_executed(Arc::new(listener));
        self
    }

    pub fn on_unhandled_trigger<F>(self, handler: F) -> Self
    where
        F: Fn(&UnhandledTrigger<S, T>) + Send + Sync + 'static,
    {
        self.hooks.set_unhandled(Arc::new(handler));
        self
    }

    pub fn on_invalid_state<F>(self, handler: F) -> Self
    where
        F: Fn(&InvalidState<S, T>) + Send + Sync + 'static,
    {
        self.hooks.set_invalid_state(Arc::new(handler));
        self
    }

    /// Synchronous machine. Fails if any callback, guard or resolver is async.
    pub fn build(self) -> Result<StateMachine<S, T>, ConfigurationError> {
        self.into_executor(false).map(StateMachine::from_executor)
    }

    /// Synchronous machine shared between threads. Fails if any callback,
    /// guard or resolver is async.
    pub fn build_blocking(self) -> Result<BlockingStateMachine<S, T>, ConfigurationError> {
        self.into_executor(false)
            .map(BlockingStateMachine::from_executor)
    }

    pub fn build_awaitable(self) -> Result<AwaitableStateMachine<S, T>, ConfigurationError> {
        self.into_executor(true)
            .map(AwaitableStateMachine::from_executor)
    }

    pub fn build_queued(self) -> Result<QueuedStateMachine<S, T>, ConfigurationError> {
        self.into_executor(true).map(QueuedStateMachine::from_executor)
    }

    pub fn build_scheduled<X: Scheduler>(
        self,
        scheduler: X,
    ) -> Result<ScheduledStateMachine<S, T>, ConfigurationError> {
        let executor = self.into_executor(true)?;
        Ok(ScheduledStateMachine::from_executor(
            executor,
            Arc::new(scheduler),
        ))
    }

    fn into_executor(self, allow_async: bool) -> Result<Executor<S, T>, ConfigurationError> {
        let Some(first) = self.configuration.first_state().cloned() else {
            return Err(ConfigurationError::EmptyConfiguration);
        };
        if !allow_async {
            if let Some(state) = self.configuration.find_async_state() {
                return Err(ConfigurationError::AsyncCallbackInSyncMachine {
                    state: format!("{state:?}"),
                });
            }
        }

        let initial = match self.initial {
            Some(state) if self.configuration.contains(&state) => state,
            Some(state) => {
                warn!(requested = ?state, fallback = ?first, "initial state not configured, using first configured state");
                first
            }
            None => first,
        };

        let executor = Executor::new(
            Arc::new(self.configuration),
            initial,
            ExecutorOptions {
                name: self.name,
                history_limit: self.history_limit,
            },
            self.hooks,
        );
        debug!(machine = %executor.id(), initial = ?executor.current_state(), "machine created");
        Ok(executor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Stage {
        Draft,
        Review,
        Published,
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Step {
        Submit,
        Approve,
    }

    fn workflow() -> Configuration<Stage, Step> {
        let mut config = Configuration::new();
        config.configure(Stage::Draft).permit(Step::Submit, Stage::Review).unwrap();
        config
            .configure(Stage::Review)
            .permit(Step::Approve, Stage::Published)
            .unwrap();
        config
    }

    #[test]
    fn empty_configuration_is_rejected() {
        let result = MachineBuilder::<Stage, Step>::new(Configuration::new()).build();

        assert!(matches!(result, Err(ConfigurationError::EmptyConfiguration)));
    }

    #[test]
    fn missing_initial_state_falls_back_to_first_configured() {
        let machine = MachineBuilder::new(workflow()).build().unwrap();

        assert_eq!(machine.current_state(), Stage::Draft);
    }

    #[test]
    fn unknown_initial_state_falls_back_to_first_configured() {
        let mut config = Configuration::new();
        config.configure(Stage::Review).permit(Step::Approve, Stage::Draft).unwrap();

        let machine = MachineBuilder::new(config)
            .initial(Stage::Published)
            .build()
            .unwrap();

        assert_eq!(machine.current_state(), Stage::Review);
    }

    #[test]
    fn listeners_registered_on_builder_see_first_transition() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let machine = MachineBuilder::new(workflow())
            .initial(Stage::Draft)
            .name("articles")
            .on_transition_executed(move |event| sink.lock().unwrap().push((event.from, event.to)))
            .build()
            .unwrap();
        machine.fire(Step::Submit).unwrap();

        assert_eq!(machine.name(), Some("articles"));
        assert_eq!(*seen.lock().unwrap(), vec![(Stage::Draft, Stage::Review)]);
    }

    #[test]
    fn history_is_off_unless_requested() {
        let plain = MachineBuilder::new(workflow()).build().unwrap();
        let tracked = MachineBuilder::new(workflow()).track_history(1).build().unwrap();

        plain.fire(Step::Submit).unwrap();
        tracked.fire(Step::Submit).unwrap();
        tracked.fire(Step::Approve).unwrap();

        assert!(plain.history().is_none());
        let history = tracked.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().unwrap().to, Stage::Published);
    }

    #[test]
    fn async_shapes_need_an_async_machine() {
        let mut config = workflow();
        config.configure(Stage::Published).on_entry_async(|| async {});

        let sync = MachineBuilder::new(config.clone()).build();
        let awaitable = MachineBuilder::new(config).build_awaitable();

        assert_eq!(
            sync.err(),
            Some(ConfigurationError::AsyncCallbackInSyncMachine {
                state: "Published".to_string()
            })
        );
        assert!(awaitable.is_ok());
    }
}
