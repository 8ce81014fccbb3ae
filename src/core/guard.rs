//! Guard predicates for controlling state transitions.
//!
//! Guards are nullary boolean functions evaluated when a trigger fires. A
//! rejected guard makes the trigger behave as if it was not configured.
//! Guards may be evaluated speculatively (see `can_handle`), so they are
//! expected to be free of side effects.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

type SyncPredicate = Arc<dyn Fn() -> bool + Send + Sync>;
type AsyncPredicate = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Predicate that determines if a transition can execute.
///
/// # Example
///
/// ```rust
/// use liquid_fsm::builder::Configuration;
/// use liquid_fsm::core::Guard;
/// use liquid_fsm::machine::StateMachine;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Alarm { Idle, Armed }
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Key { Arm }
///
/// let door_closed = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&door_closed);
///
/// let mut config = Configuration::new();
/// config
///     .configure(Alarm::Idle)
///     .permit_if(Key::Arm, Alarm::Armed, Guard::new(move || flag.load(Ordering::SeqCst)))
///     .unwrap();
/// let alarm = StateMachine::new(config, Alarm::Idle).unwrap();
///
/// assert!(!alarm.can_handle(&Key::Arm));
/// door_closed.store(true, Ordering::SeqCst);
/// assert!(alarm.can_handle(&Key::Arm));
/// ```
#[derive(Clone)]
pub enum Guard {
    /// Evaluated inline.
    Sync(SyncPredicate),
    /// Evaluated by awaiting the returned future.
    Async(AsyncPredicate),
}

impl Guard {
    /// Create a guard from a synchronous predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Guard::Sync(Arc::new(predicate))
    }

    /// Create a guard from a predicate returning a future.
    ///
    /// Only awaitable machines (plain, queued and scheduled) accept
    /// configurations holding async guards.
    pub fn from_async<F, Fut>(predicate: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Guard::Async(Arc::new(move || predicate().boxed()))
    }

    /// Whether evaluating this guard requires an executor.
    pub fn is_async(&self) -> bool {
        matches!(self, Guard::Async(_))
    }

    /// Evaluate the guard, awaiting it if necessary.
    pub async fn evaluate(&self) -> bool {
        match self {
            Guard::Sync(predicate) => predicate(),
            Guard::Async(predicate) => predicate().await,
        }
    }
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guard::Sync(_) => f.write_str("Guard::Sync"),
            Guard::Async(_) => f.write_str("Guard::Async"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn guard_shape_is_reported() {
        assert!(!Guard::new(|| true).is_async());
        assert!(Guard::from_async(|| async { true }).is_async());
    }

    #[tokio::test]
    async fn evaluate_awaits_async_guards() {
        let guard = Guard::from_async(|| async {
            tokio::task::yield_now().await;
            false
        });

        assert!(!guard.evaluate().await);
        assert!(Guard::new(|| true).evaluate().await);
    }

    #[tokio::test]
    async fn guard_reads_captured_state_on_each_evaluation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let guard = Guard::new(move || counter.fetch_add(1, Ordering::SeqCst) % 2 == 0);

        assert!(guard.evaluate().await);
        assert!(!guard.evaluate().await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
