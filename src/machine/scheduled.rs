//! Machines bound to a scheduler, and the schedulers they run on.
//!
//! Every call on a [`ScheduledStateMachine`] is packaged as a unit of work and
//! handed to its [`Scheduler`]; the caller awaits the result. Callbacks thus
//! always run where the scheduler puts them, whichever thread the caller is on.

use super::awaitable::AwaitableStateMachine;
use super::executor::{Executor, MoveOptions};
use super::TransitionError;
use crate::builder::{Configuration, ConfigurationError, MachineBuilder};
use crate::core::{ParameterizedTrigger, State, Trigger};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

/// Runs units of work submitted by a scheduled machine.
///
/// Dropping a unit without running it is allowed; the waiting caller then
/// observes [`TransitionError::Cancelled`].
pub trait Scheduler: Send + Sync + 'static {
    fn schedule(&self, work: BoxFuture<'static, ()>);
}

impl<X: Scheduler + ?Sized> Scheduler for Arc<X> {
    fn schedule(&self, work: BoxFuture<'static, ()>) {
        (**self).schedule(work)
    }
}

/// Spawns work onto a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// The runtime the caller is running in, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, work: BoxFuture<'static, ()>) {
        self.handle.spawn(work);
    }
}

/// A dedicated OS thread driving a single-threaded runtime.
///
/// All work runs on that thread. The thread exits once the scheduler is
/// dropped and the submitted work has been taken off the channel.
pub struct WorkerScheduler {
    tx: mpsc::UnboundedSender<BoxFuture<'static, ()>>,
    thread_name: String,
}

impl WorkerScheduler {
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let thread_name = name.into();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<BoxFuture<'static, ()>>();

        let worker = thread_name.clone();
        std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                runtime.block_on(async move {
                    while let Some(work) = rx.recv().await {
                        let worker = worker.clone();
                        tokio::spawn(async move {
                            if AssertUnwindSafe(work).catch_unwind().await.is_err() {
                                error!(worker = %worker, "scheduled work panicked");
                            }
                        });
                    }
                    debug!(worker = %worker, "scheduler closed");
                });
            })?;

        Ok(Self { tx, thread_name })
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }
}

impl fmt::Debug for WorkerScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerScheduler")
            .field("thread_name", &self.thread_name)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl Scheduler for WorkerScheduler {
    fn schedule(&self, work: BoxFuture<'static, ()>) {
        if self.tx.send(work).is_err() {
            error!(worker = %self.thread_name, "scheduler thread is gone, work dropped");
        }
    }
}

/// Awaitable machine whose transitions all run on a [`Scheduler`].
///
/// Exclusion follows [`AwaitableStateMachine`]: a request that reaches the
/// machine while another transition is in flight fails with
/// [`TransitionError::InTransition`].
pub struct ScheduledStateMachine<S, T> {
    machine: Arc<AwaitableStateMachine<S, T>>,
    scheduler: Arc<dyn Scheduler>,
}

impl<S, T> Clone for ScheduledStateMachine<S, T> {
    fn clone(&self) -> Self {
        Self {
            machine: Arc::clone(&self.machine),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<S: State, T: Trigger> ScheduledStateMachine<S, T> {
    pub fn new<X: Scheduler>(
        configuration: Configuration<S, T>,
        initial: S,
        scheduler: X,
    ) -> Result<Self, ConfigurationError> {
        MachineBuilder::new(configuration)
            .initial(initial)
            .build_scheduled(scheduler)
    }

    pub(crate) fn from_executor(executor: Executor<S, T>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            machine: Arc::new(AwaitableStateMachine::from_executor(executor)),
            scheduler,
        }
    }

    pub async fn fire(&self, trigger: T) -> Result<(), TransitionError> {
        let machine = Arc::clone(&self.machine);
        self.dispatch(async move { machine.fire(trigger).await })
            .await
            .unwrap_or(Err(TransitionError::Cancelled))
    }

    pub async fn fire_with<A: Any + Send>(
        &self,
        trigger: &ParameterizedTrigger<T, A>,
        argument: A,
    ) -> Result<(), TransitionError> {
        let machine = Arc::clone(&self.machine);
        let trigger = trigger.clone();
        self.dispatch(async move { machine.fire_with(&trigger, argument).await })
            .await
            .unwrap_or(Err(TransitionError::Cancelled))
    }

    pub async fn move_to_state(&self, state: S, options: MoveOptions) -> Result<(), TransitionError> {
        let machine = Arc::clone(&self.machine);
        self.dispatch(async move { machine.move_to_state(state, options).await })
            .await
            .unwrap_or(Err(TransitionError::Cancelled))
    }

    /// Evaluated on the scheduler, like a transition. False if the work was
    /// dropped.
    pub async fn can_handle(&self, trigger: &T) -> bool {
        let machine = Arc::clone(&self.machine);
        let trigger = trigger.clone();
        self.dispatch(async move { machine.can_handle(&trigger).await })
            .await
            .unwrap_or(false)
    }

    pub fn is_in_transition(&self) -> bool {
        self.machine.is_in_transition()
    }

    async fn dispatch<F, R>(&self, work: F) -> Option<R>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.scheduler.schedule(Box::pin(async move {
            let _ = tx.send(work.await);
        }));
        rx.await.ok()
    }

    fn executor(&self) -> &Executor<S, T> {
        self.machine.executor()
    }
}

machine_accessors!(ScheduledStateMachine);
