//! Transition executor shared by every machine variant.
//!
//! One algorithm serves all flavors: trigger lookup, guard evaluation,
//! target resolution, argument validation, then exit, action and entry
//! callbacks in that order, and finally the commit of the new state.
//! Awaitable machines await it; synchronous machines poll it exactly once,
//! which completes because their configurations hold no async shapes.

use super::error::{Rejection, TransitionError};
use super::events::{Hooks, InvalidState, TransitionEvent, UnhandledTrigger};
use crate::builder::Configuration;
use crate::core::{
    Action, Argument, ArgumentType, CallbackError, State, StateHistory, StateRepresentation,
    StateTransition, Target, Trigger,
};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, trace, warn, Instrument};
use uuid::Uuid;

/// Identifier of a machine instance, attached to its log records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MachineId(Uuid);

impl MachineId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which callbacks a forced move runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveOptions {
    pub exit: bool,
    pub entry: bool,
}

impl MoveOptions {
    pub const BOTH: Self = Self {
        exit: true,
        entry: true,
    };
    pub const NONE: Self = Self {
        exit: false,
        entry: false,
    };
    pub const EXIT_ONLY: Self = Self {
        exit: true,
        entry: false,
    };
    pub const ENTRY_ONLY: Self = Self {
        exit: false,
        entry: true,
    };
}

impl Default for MoveOptions {
    fn default() -> Self {
        Self::BOTH
    }
}

/// Argument of a parameterized fire, with its runtime type.
pub(crate) struct Payload {
    value: Argument,
    ty: ArgumentType,
}

impl Payload {
    pub(crate) fn new<A: Any + Send>(value: A) -> Self {
        Self {
            value: Box::new(value),
            ty: ArgumentType::of::<A>(),
        }
    }
}

/// A unit of work for the executor.
pub(crate) enum Request<S, T> {
    Fire {
        trigger: T,
        payload: Option<Payload>,
    },
    Move {
        state: S,
        options: MoveOptions,
    },
}

impl<S, T> Request<S, T> {
    pub(crate) fn fire(trigger: T) -> Self {
        Request::Fire {
            trigger,
            payload: None,
        }
    }

    pub(crate) fn fire_with<A: Any + Send>(trigger: T, argument: A) -> Self {
        Request::Fire {
            trigger,
            payload: Some(Payload::new(argument)),
        }
    }

    pub(crate) fn move_to(state: S, options: MoveOptions) -> Self {
        Request::Move { state, options }
    }
}

/// Resolved transition, ready to run its callbacks.
struct Plan<'a, S, T> {
    from: &'a StateRepresentation<S, T>,
    to: &'a StateRepresentation<S, T>,
    action: Option<&'a Action>,
    payload: Option<Payload>,
    event: TransitionEvent<S, T>,
    options: MoveOptions,
}

#[derive(Debug, Default)]
pub(crate) struct ExecutorOptions {
    pub(crate) name: Option<String>,
    pub(crate) history_limit: Option<usize>,
}

pub(crate) struct Executor<S, T> {
    id: MachineId,
    name: Option<String>,
    configuration: Arc<Configuration<S, T>>,
    current: RwLock<S>,
    enabled: AtomicBool,
    hooks: Hooks<S, T>,
    history: Option<Mutex<StateHistory<S, T>>>,
}

impl<S: State, T: Trigger> Executor<S, T> {
    pub(crate) fn new(
        configuration: Arc<Configuration<S, T>>,
        initial: S,
        options: ExecutorOptions,
        hooks: Hooks<S, T>,
    ) -> Self {
        Self {
            id: MachineId::new(),
            name: options.name,
            configuration,
            current: RwLock::new(initial),
            enabled: AtomicBool::new(true),
            hooks,
            history: options
                .history_limit
                .map(|limit| Mutex::new(StateHistory::with_limit(limit))),
        }
    }

    pub(crate) fn id(&self) -> MachineId {
        self.id
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn hooks(&self) -> &Hooks<S, T> {
        &self.hooks
    }

    pub(crate) fn current_state(&self) -> S {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        debug!(machine = %self.id, enabled, "machine enable flag changed");
    }

    pub(crate) fn history(&self) -> Option<StateHistory<S, T>> {
        self.history
            .as_ref()
            .map(|history| history.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    /// Triggers configured for the current state, guards not evaluated.
    pub(crate) fn permitted_triggers(&self) -> Vec<T> {
        self.current_representation()
            .map(|rep| rep.triggers.iter().map(|t| t.trigger.clone()).collect())
            .unwrap_or_default()
    }

    /// Run one request to completion.
    pub(crate) async fn execute(&self, request: Request<S, T>) -> Result<(), TransitionError> {
        let span = tracing::debug_span!(
            "transition",
            machine = %self.id,
            name = self.name.as_deref().unwrap_or("unnamed"),
        );
        async move {
            if !self.is_enabled() {
                trace!("machine paused, request dropped");
                return Ok(());
            }
            let plan = match request {
                Request::Fire { trigger, payload } => self.plan_fire(trigger, payload).await?,
                Request::Move { state, options } => self.plan_move(state, options)?,
            };
            match plan {
                Some(plan) => self.run(plan).await,
                None => Ok(()),
            }
        }
        .instrument(span)
        .await
    }

    /// Run one request inline, for machines whose callbacks never suspend.
    pub(crate) fn execute_inline(&self, request: Request<S, T>) -> Result<(), TransitionError> {
        self.execute(request)
            .now_or_never()
            .unwrap_or(Err(TransitionError::Suspended))
    }

    /// Whether firing `trigger` now would be accepted.
    ///
    /// Guards and dynamic resolvers are evaluated speculatively and are
    /// expected to be side-effect free.
    pub(crate) async fn can_handle(&self, trigger: &T) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let Some(rep) = self
            .current_representation()
            .ok()
            .and_then(|from| from.find_trigger(trigger))
        else {
            return false;
        };
        if let Some(guard) = &rep.guard {
            if !guard.evaluate().await {
                return false;
            }
        }
        match &rep.target {
            Target::Ignore | Target::State(_) => true,
            Target::Dynamic(resolver) => {
                let resolved = resolver.resolve().await;
                resolved.can_transition && self.configuration.contains(&resolved.state)
            }
        }
    }

    pub(crate) fn can_handle_inline(&self, trigger: &T) -> bool {
        self.can_handle(trigger).now_or_never().unwrap_or(false)
    }

    fn current_representation(&self) -> Result<&StateRepresentation<S, T>, TransitionError> {
        let state = self.current_state();
        self.configuration
            .get(&state)
            .ok_or_else(|| TransitionError::InvalidState {
                state: format!("{state:?}"),
            })
    }

    async fn plan_fire(
        &self,
        trigger: T,
        payload: Option<Payload>,
    ) -> Result<Option<Plan<'_, S, T>>, TransitionError> {
        let from = self.current_representation()?;
        let Some(rep) = from.find_trigger(&trigger) else {
            return self.unhandled(from, trigger, Rejection::NotConfigured);
        };

        if let Some(guard) = &rep.guard {
            let passed = guard.evaluate().await;
            trace!(trigger = ?trigger, passed, "guard evaluated");
            if !passed {
                return self.unhandled(from, trigger, Rejection::GuardRejected);
            }
        }

        let next = match &rep.target {
            Target::Ignore => {
                trace!(state = ?from.state, trigger = ?trigger, "trigger ignored");
                return Ok(None);
            }
            Target::State(state) => state.clone(),
            Target::Dynamic(resolver) => {
                let resolved = resolver.resolve().await;
                if !resolved.can_transition {
                    return self.unhandled(from, trigger, Rejection::DynamicRejected);
                }
                resolved.state
            }
        };

        let Some(to) = self.configuration.get(&next) else {
            return self.invalid_state(from, next, Some(trigger));
        };
        check_argument(&trigger, rep.argument, &rep.action, payload.as_ref())?;

        Ok(Some(Plan {
            from,
            to,
            action: Some(&rep.action),
            payload,
            event: TransitionEvent {
                from: from.state.clone(),
                to: next,
                trigger: Some(trigger),
            },
            options: MoveOptions::BOTH,
        }))
    }

    fn plan_move(
        &self,
        state: S,
        options: MoveOptions,
    ) -> Result<Option<Plan<'_, S, T>>, TransitionError> {
        let from = self.current_representation()?;
        let Some(to) = self.configuration.get(&state) else {
            return self.invalid_state(from, state, None);
        };

        Ok(Some(Plan {
            from,
            to,
            action: None,
            payload: None,
            event: TransitionEvent {
                from: from.state.clone(),
                to: state,
                trigger: None,
            },
            options,
        }))
    }

    async fn run(&self, plan: Plan<'_, S, T>) -> Result<(), TransitionError> {
        let Plan {
            from,
            to,
            action,
            payload,
            event,
            options,
        } = plan;

        debug!(from = ?event.from, to = ?event.to, trigger = ?event.trigger, "transition started");
        self.hooks.transition_started(&event);

        let result = async {
            if options.exit {
                if let Some(on_exit) = &from.on_exit {
                    on_exit.invoke().await?;
                }
            }
            if let Some(action) = action {
                action.invoke(payload.map(|p| p.value)).await?;
            }
            if options.entry {
                if let Some(on_entry) = &to.on_entry {
                    on_entry.invoke().await?;
                }
            }
            Ok::<(), CallbackError>(())
        }
        .await;

        if let Err(err) = result {
            debug!(from = ?event.from, to = ?event.to, error = %err, "transition aborted by callback");
            return Err(TransitionError::Callback(err));
        }

        self.commit(event);
        Ok(())
    }

    fn commit(&self, event: TransitionEvent<S, T>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = event.to.clone();

        if let Some(history) = &self.history {
            history
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(StateTransition {
                    from: event.from.clone(),
                    to: event.to.clone(),
                    trigger: event.trigger.clone(),
                    timestamp: Utc::now(),
                });
        }

        debug!(from = ?event.from, to = ?event.to, "transition executed");
        self.hooks.transition_executed(&event);
    }

    fn unhandled<'a>(
        &'a self,
        from: &StateRepresentation<S, T>,
        trigger: T,
        reason: Rejection,
    ) -> Result<Option<Plan<'a, S, T>>, TransitionError> {
        let event = UnhandledTrigger {
            state: from.state.clone(),
            trigger,
            reason,
        };
        if self.hooks.unhandled_trigger(&event) {
            warn!(state = ?event.state, trigger = ?event.trigger, %reason, "unhandled trigger routed to handler");
            return Ok(None);
        }
        debug!(state = ?event.state, trigger = ?event.trigger, %reason, "trigger rejected");
        Err(TransitionError::InvalidTrigger {
            state: format!("{:?}", event.state),
            trigger: format!("{:?}", event.trigger),
            reason,
        })
    }

    fn invalid_state<'a>(
        &'a self,
        from: &StateRepresentation<S, T>,
        requested: S,
        trigger: Option<T>,
    ) -> Result<Option<Plan<'a, S, T>>, TransitionError> {
        let event = InvalidState {
            current: from.state.clone(),
            requested,
            trigger,
        };
        if self.hooks.invalid_state(&event) {
            warn!(current = ?event.current, requested = ?event.requested, "invalid state routed to handler");
            return Ok(None);
        }
        Err(TransitionError::InvalidState {
            state: format!("{:?}", event.requested),
        })
    }
}

/// The call shape must match the registration: a parameterized trigger
/// needs an argument of its type, a plain trigger takes none. A typed action
/// must also accept the argument.
fn check_argument<T: fmt::Debug>(
    trigger: &T,
    registered: Option<ArgumentType>,
    action: &Action,
    payload: Option<&Payload>,
) -> Result<(), TransitionError> {
    let mismatch = |expected: &'static str, found: &'static str| {
        Err(TransitionError::InvalidTriggerParameter {
            trigger: format!("{trigger:?}"),
            expected,
            found,
        })
    };
    let found = payload.map(|payload| payload.ty);
    for expected in [registered, action.argument_type()] {
        match (expected, found) {
            (Some(expected), Some(found)) if expected != found => {
                return mismatch(expected.name(), found.name())
            }
            (Some(expected), None) => return mismatch(expected.name(), "no argument"),
            (None, Some(found)) if registered.is_none() => {
                return mismatch("no argument", found.name())
            }
            _ => {}
        }
    }
    Ok(())
}
