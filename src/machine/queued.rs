//! Asynchronous machine that serializes contending requests in a FIFO queue.

use super::executor::{Executor, MachineId, MoveOptions, Request};
use super::guard::TransitionGuard;
use super::TransitionError;
use crate::builder::{Configuration, ConfigurationError, MachineBuilder};
use crate::core::{ParameterizedTrigger, State, Trigger};
use std::any::Any;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

type Outcome = Result<(), TransitionError>;

tokio::task_local! {
    /// Machine whose queue the current task is draining.
    static DRAINING: MachineId;
}

struct Pending<S, T> {
    request: Request<S, T>,
    done: oneshot::Sender<Outcome>,
}

struct Shared<S, T> {
    executor: Executor<S, T>,
    guard: TransitionGuard,
    queue: Mutex<VecDeque<Pending<S, T>>>,
}

/// Completion of a queued request.
///
/// Resolves to the request's own result once the queue reaches it, or to
/// [`TransitionError::Cancelled`] if the request was discarded first.
#[derive(Debug)]
pub struct PendingTransition {
    rx: oneshot::Receiver<Outcome>,
}

impl Future for PendingTransition {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(TransitionError::Cancelled)))
    }
}

/// Machine that queues contending requests instead of rejecting them.
///
/// A request arriving while a transition is in flight is appended to a queue
/// and runs after everything queued before it. The caller that finds the
/// machine idle runs its own request and then keeps draining the queue until
/// it is empty. If that caller is cancelled, draining continues on a spawned
/// tokio task.
///
/// Callbacks must not await [`fire`](Self::fire) on their own machine: the
/// request would wait behind the transition that is waiting for it, so such
/// a call fails with [`TransitionError::InTransition`]. Use
/// [`enqueue_fire`](Self::enqueue_fire) instead, which returns immediately.
///
/// Cloning is cheap and every clone drives the same machine.
pub struct QueuedStateMachine<S, T> {
    shared: Arc<Shared<S, T>>,
}

impl<S, T> Clone for QueuedStateMachine<S, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: State, T: Trigger> QueuedStateMachine<S, T> {
    pub fn new(configuration: Configuration<S, T>, initial: S) -> Result<Self, ConfigurationError> {
        MachineBuilder::new(configuration)
            .initial(initial)
            .build_queued()
    }

    pub(crate) fn from_executor(executor: Executor<S, T>) -> Self {
        Self {
            shared: Arc::new(Shared {
                executor,
                guard: TransitionGuard::new(),
                queue: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub async fn fire(&self, trigger: T) -> Result<(), TransitionError> {
        self.submit(Request::fire(trigger)).await
    }

    pub async fn fire_with<A: Any + Send>(
        &self,
        trigger: &ParameterizedTrigger<T, A>,
        argument: A,
    ) -> Result<(), TransitionError> {
        self.submit(Request::fire_with(trigger.trigger().clone(), argument))
            .await
    }

    pub async fn move_to_state(&self, state: S, options: MoveOptions) -> Result<(), TransitionError> {
        self.submit(Request::move_to(state, options)).await
    }

    /// Queue `trigger` without waiting for it to run.
    ///
    /// Safe to call from a callback of this machine. When the machine is idle
    /// the queue is drained on a spawned tokio task.
    pub fn enqueue_fire(&self, trigger: T) -> PendingTransition {
        self.enqueue(Request::fire(trigger))
    }

    pub fn enqueue_fire_with<A: Any + Send>(
        &self,
        trigger: &ParameterizedTrigger<T, A>,
        argument: A,
    ) -> PendingTransition {
        self.enqueue(Request::fire_with(trigger.trigger().clone(), argument))
    }

    pub fn enqueue_move(&self, state: S, options: MoveOptions) -> PendingTransition {
        self.enqueue(Request::move_to(state, options))
    }

    /// Discard every request still waiting in the queue. Their callers
    /// observe [`TransitionError::Cancelled`]. Returns how many were dropped.
    pub fn skip_pending(&self) -> usize {
        let skipped: Vec<_> = self.shared.lock_queue().drain(..).collect();
        if !skipped.is_empty() {
            debug!(machine = %self.shared.executor.id(), skipped = skipped.len(), "pending requests skipped");
        }
        skipped.len()
    }

    pub fn pending_count(&self) -> usize {
        self.shared.lock_queue().len()
    }

    pub async fn can_handle(&self, trigger: &T) -> bool {
        self.shared.executor.can_handle(trigger).await
    }

    pub fn is_in_transition(&self) -> bool {
        self.shared.guard.is_held()
    }

    async fn submit(&self, request: Request<S, T>) -> Outcome {
        let id = self.shared.executor.id();
        if DRAINING.try_with(|draining| *draining == id).unwrap_or(false) {
            warn!(machine = %id, "callback awaited a request on its own queue, use enqueue_fire");
            return Err(TransitionError::InTransition);
        }
        let request = match self.shared.admit(request) {
            Ok(request) => request,
            Err(pending) => return pending.await,
        };
        let drain = Drain::new(Arc::clone(&self.shared), DrainMode::Caller);
        let result = self.shared.execute(request).await;
        drain.run().await;
        result
    }

    fn enqueue(&self, request: Request<S, T>) -> PendingTransition {
        let (done, rx) = oneshot::channel();
        let idle = {
            let mut queue = self.shared.lock_queue();
            queue.push_back(Pending { request, done });
            self.shared.guard.try_lock()
        };
        if idle {
            Drain::new(Arc::clone(&self.shared), DrainMode::Caller).hand_off();
        }
        PendingTransition { rx }
    }

    fn executor(&self) -> &Executor<S, T> {
        &self.shared.executor
    }
}

impl<S: State, T: Trigger> Shared<S, T> {
    async fn execute(&self, request: Request<S, T>) -> Outcome {
        DRAINING
            .scope(self.executor.id(), self.executor.execute(request))
            .await
    }

    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Pending<S, T>>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the guard for `request`, or queue it behind the transition in
    /// flight.
    fn admit(&self, request: Request<S, T>) -> Result<Request<S, T>, PendingTransition> {
        let mut queue = self.lock_queue();
        if self.guard.try_lock() {
            return Ok(request);
        }
        let (done, rx) = oneshot::channel();
        queue.push_back(Pending { request, done });
        trace!(machine = %self.executor.id(), queued = queue.len(), "request queued");
        Err(PendingTransition { rx })
    }

    /// Pop the next request, releasing the guard when none is left. Both
    /// happen under the queue lock so a concurrent `admit` cannot strand a
    /// request.
    fn next_or_release(&self) -> Option<Pending<S, T>> {
        let mut queue = self.lock_queue();
        let next = queue.pop_front();
        if next.is_none() {
            self.guard.unlock();
        }
        next
    }

    fn abandon(&self) {
        let dropped = {
            let mut queue = self.lock_queue();
            let dropped: Vec<_> = queue.drain(..).collect();
            self.guard.unlock();
            dropped
        };
        warn!(machine = %self.executor.id(), dropped = dropped.len(), "queue drain interrupted, pending requests cancelled");
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DrainMode {
    /// Driven by a caller of the machine; interrupted, it moves to a task.
    Caller,
    /// Driven by a spawned task; interrupted, it cancels what is left.
    Task,
}

/// Owns the guard while the queue is drained. Dropped before the queue is
/// empty, it either hands the remaining work to a new task or, if it already
/// is that task, cancels it.
struct Drain<S: State, T: Trigger> {
    shared: Arc<Shared<S, T>>,
    mode: DrainMode,
    released: bool,
}

impl<S: State, T: Trigger> Drain<S, T> {
    fn new(shared: Arc<Shared<S, T>>, mode: DrainMode) -> Self {
        Self {
            shared,
            mode,
            released: false,
        }
    }

    async fn run(mut self) {
        let waiting = !self.shared.lock_queue().is_empty();
        if waiting {
            tokio::task::yield_now().await;
        }
        while let Some(Pending { request, done }) = self.shared.next_or_release() {
            let result = self.shared.execute(request).await;
            let _ = done.send(result);
        }
        self.released = true;
    }

    fn hand_off(&mut self) {
        self.released = true;
        let shared = Arc::clone(&self.shared);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                trace!(machine = %shared.executor.id(), "queue drain moved to a task");
                handle.spawn(Drain::new(shared, DrainMode::Task).run());
            }
            Err(_) => shared.abandon(),
        }
    }
}

impl<S: State, T: Trigger> Drop for Drain<S, T> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.mode {
            DrainMode::Caller => self.hand_off(),
            DrainMode::Task => {
                self.released = true;
                self.shared.abandon();
            }
        }
    }
}

machine_accessors!(QueuedStateMachine);
