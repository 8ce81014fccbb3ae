//! Lifecycle notifications and unhandled-trigger handlers.

use super::error::Rejection;
use std::sync::{Arc, PoisonError, RwLock};

/// A transition that is starting or has just been executed.
///
/// `trigger` is `None` for forced moves made with `move_to_state`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionEvent<S, T> {
    pub from: S,
    pub to: S,
    pub trigger: Option<T>,
}

/// A trigger that could not be handled from `state`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnhandledTrigger<S, T> {
    pub state: S,
    pub trigger: T,
    pub reason: Rejection,
}

/// A transition target without a configured record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidState<S, T> {
    pub current: S,
    pub requested: S,
    pub trigger: Option<T>,
}

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Registered listeners of one machine.
///
/// Listeners are copied out before being called, so a listener may register
/// further listeners without deadlocking.
pub(crate) struct Hooks<S, T> {
    started: RwLock<Vec<Listener<TransitionEvent<S, T>>>>,
    executed: RwLock<Vec<Listener<TransitionEvent<S, T>>>>,
    unhandled: RwLock<Option<Listener<UnhandledTrigger<S, T>>>>,
    invalid_state: RwLock<Option<Listener<InvalidState<S, T>>>>,
}

impl<S, T> Hooks<S, T> {
    pub(crate) fn new() -> Self {
        Self {
            started: RwLock::new(Vec::new()),
            executed: RwLock::new(Vec::new()),
            unhandled: RwLock::new(None),
            invalid_state: RwLock::new(None),
        }
    }

    pub(crate) fn add_started(&self, listener: Listener<TransitionEvent<S, T>>) {
        write(&self.started).push(listener);
    }

    pub(crate) fn add_executed(&self, listener: Listener<TransitionEvent<S, T>>) {
        write(&self.executed).push(listener);
    }

    pub(crate) fn set_unhandled(&self, handler: Listener<UnhandledTrigger<S, T>>) {
        *write(&self.unhandled) = Some(handler);
    }

    pub(crate) fn set_invalid_state(&self, handler: Listener<InvalidState<S, T>>) {
        *write(&self.invalid_state) = Some(handler);
    }

    pub(crate) fn transition_started(&self, event: &TransitionEvent<S, T>) {
        let listeners = read(&self.started).clone();
        for listener in listeners {
            listener(event);
        }
    }

    pub(crate) fn transition_executed(&self, event: &TransitionEvent<S, T>) {
        let listeners = read(&self.executed).clone();
        for listener in listeners {
            listener(event);
        }
    }

    /// Route an unhandled trigger to the handler. Returns false when no
    /// handler is registered and the caller should raise an error instead.
    pub(crate) fn unhandled_trigger(&self, event: &UnhandledTrigger<S, T>) -> bool {
        let handler = read(&self.unhandled).clone();
        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    pub(crate) fn invalid_state(&self, event: &InvalidState<S, T>) -> bool {
        let handler = read(&self.invalid_state).clone();
        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }
}

fn read<V>(lock: &RwLock<V>) -> std::sync::RwLockReadGuard<'_, V> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<V>(lock: &RwLock<V>) -> std::sync::RwLockWriteGuard<'_, V> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
