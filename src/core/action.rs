//! Entry/exit callbacks and trigger actions.
//!
//! Callbacks come in two shapes, synchronous and future-returning, and
//! actions additionally in a nullary and a unary (argument-taking) form.
//! Both are closed enums so the executor can branch on the shape instead of
//! casting.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::{Any, TypeId};
use std::future::Future;
use std::sync::Arc;

/// Error returned from a user callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Result of running a user callback.
pub type CallbackResult = Result<(), CallbackError>;

/// Type-erased trigger argument.
pub type Argument = Box<dyn Any + Send>;

/// Values a callback may return.
///
/// Callbacks that cannot fail return `()`. Fallible callbacks return
/// `Result<(), E>`; an `Err` aborts the transition.
pub trait CallbackOutput {
    fn into_callback_result(self) -> CallbackResult;
}

impl CallbackOutput for () {
    fn into_callback_result(self) -> CallbackResult {
        Ok(())
    }
}

impl<E> CallbackOutput for Result<(), E>
where
    E: Into<CallbackError>,
{
    fn into_callback_result(self) -> CallbackResult {
        self.map_err(Into::into)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("action expected an argument of type {expected}")]
struct ArgumentMismatch {
    expected: &'static str,
}

/// Runtime description of an action's argument type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgumentType {
    id: TypeId,
    name: &'static str,
}

impl ArgumentType {
    pub fn of<A: Any>() -> Self {
        Self {
            id: TypeId::of::<A>(),
            name: std::any::type_name::<A>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

type SyncCallback = Arc<dyn Fn() -> CallbackResult + Send + Sync>;
type AsyncCallback = Arc<dyn Fn() -> BoxFuture<'static, CallbackResult> + Send + Sync>;
type SyncArgCallback = Arc<dyn Fn(Argument) -> CallbackResult + Send + Sync>;
type AsyncArgCallback = Arc<dyn Fn(Argument) -> BoxFuture<'static, CallbackResult> + Send + Sync>;

/// Entry or exit callback of a state.
#[derive(Clone)]
pub enum Callback {
    Sync(SyncCallback),
    Async(AsyncCallback),
}

impl Callback {
    pub fn new<F, R>(callback: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: CallbackOutput,
    {
        Callback::Sync(Arc::new(move || callback().into_callback_result()))
    }

    pub fn from_async<F, Fut, R>(callback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: CallbackOutput + 'static,
    {
        Callback::Async(Arc::new(move || {
            callback().map(CallbackOutput::into_callback_result).boxed()
        }))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Callback::Async(_))
    }

    pub async fn invoke(&self) -> CallbackResult {
        match self {
            Callback::Sync(callback) => callback(),
            Callback::Async(callback) => callback().await,
        }
    }
}

impl std::fmt::Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callback::Sync(_) => f.write_str("Callback::Sync"),
            Callback::Async(_) => f.write_str("Callback::Async"),
        }
    }
}

/// Action run when a trigger fires, between the exit and entry callbacks.
///
/// # Example
///
/// ```rust
/// use liquid_fsm::core::Action;
///
/// let log = Action::new(|| println!("connecting"));
/// let greet = Action::with_arg(|name: String| println!("hello {name}"));
///
/// assert!(log.argument_type().is_none());
/// assert_eq!(
///     greet.argument_type().map(|ty| ty.name()),
///     Some(std::any::type_name::<String>())
/// );
/// ```
#[derive(Clone, Default)]
pub enum Action {
    #[default]
    None,
    Sync(SyncCallback),
    SyncWithArg(ArgumentType, SyncArgCallback),
    Async(AsyncCallback),
    AsyncWithArg(ArgumentType, AsyncArgCallback),
}

impl Action {
    pub fn new<F, R>(action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: CallbackOutput,
    {
        Action::Sync(Arc::new(move || action().into_callback_result()))
    }

    pub fn from_async<F, Fut, R>(action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: CallbackOutput + 'static,
    {
        Action::Async(Arc::new(move || {
            action().map(CallbackOutput::into_callback_result).boxed()
        }))
    }

    pub fn with_arg<A, F, R>(action: F) -> Self
    where
        A: Any + Send,
        F: Fn(A) -> R + Send + Sync + 'static,
        R: CallbackOutput,
    {
        let expected = ArgumentType::of::<A>();
        Action::SyncWithArg(
            expected,
            Arc::new(move |argument: Argument| match argument.downcast::<A>() {
                Ok(value) => action(*value).into_callback_result(),
                Err(_) => Err(ArgumentMismatch {
                    expected: expected.name(),
                }
                .into()),
            }),
        )
    }

    pub fn with_arg_async<A, F, Fut, R>(action: F) -> Self
    where
        A: Any + Send,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: CallbackOutput + 'static,
    {
        let expected = ArgumentType::of::<A>();
        let action = Arc::new(action);
        Action::AsyncWithArg(
            expected,
            Arc::new(move |argument: Argument| {
                let action = Arc::clone(&action);
                async move {
                    match argument.downcast::<A>() {
                        Ok(value) => action(*value).await.into_callback_result(),
                        Err(_) => Err(ArgumentMismatch {
                            expected: expected.name(),
                        }
                        .into()),
                    }
                }
                .boxed()
            }),
        )
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Action::Async(_) | Action::AsyncWithArg(..))
    }

    /// The argument type a unary action expects, `None` for nullary actions.
    pub fn argument_type(&self) -> Option<ArgumentType> {
        match self {
            Action::SyncWithArg(ty, _) | Action::AsyncWithArg(ty, _) => Some(*ty),
            _ => None,
        }
    }

    pub async fn invoke(&self, argument: Option<Argument>) -> CallbackResult {
        match self {
            Action::None => Ok(()),
            Action::Sync(action) => action(),
            Action::SyncWithArg(ty, action) => match argument {
                Some(argument) => action(argument),
                None => Err(ArgumentMismatch { expected: ty.name() }.into()),
            },
            Action::Async(action) => action().await,
            Action::AsyncWithArg(ty, action) => match argument {
                Some(argument) => action(argument).await,
                None => Err(ArgumentMismatch { expected: ty.name() }.into()),
            },
        }
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::None => f.write_str("Action::None"),
            Action::Sync(_) => f.write_str("Action::Sync"),
            Action::SyncWithArg(ty, _) => write!(f, "Action::SyncWithArg({})", ty.name()),
            Action::Async(_) => f.write_str("Action::Async"),
            Action::AsyncWithArg(ty, _) => write!(f, "Action::AsyncWithArg({})", ty.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("line busy")]
    struct Busy;

    #[test]
    fn unit_and_result_outputs_convert() {
        assert!(().into_callback_result().is_ok());
        assert!(Ok::<(), Busy>(()).into_callback_result().is_ok());

        let err = Err::<(), Busy>(Busy).into_callback_result().unwrap_err();
        assert_eq!(err.to_string(), "line busy");
    }

    #[test]
    fn argument_types_compare_by_type() {
        assert_eq!(ArgumentType::of::<String>(), ArgumentType::of::<String>());
        assert_ne!(ArgumentType::of::<String>(), ArgumentType::of::<u32>());
        assert_eq!(ArgumentType::of::<u32>().name(), "u32");
    }

    #[tokio::test]
    async fn sync_action_with_arg_receives_value() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let action = Action::with_arg(move |name: String| {
            *sink.lock().unwrap() = Some(name);
        });

        let result = action.invoke(Some(Box::new("John Doe".to_string()))).await;

        assert!(result.is_ok());
        assert_eq!(seen.lock().unwrap().as_deref(), Some("John Doe"));
    }

    #[tokio::test]
    async fn unary_action_rejects_missing_or_foreign_argument() {
        let action = Action::with_arg(|_: u8| ());

        assert!(action.invoke(None).await.is_err());
        assert!(action.invoke(Some(Box::new("seven"))).await.is_err());
    }

    #[tokio::test]
    async fn async_shapes_are_awaited() {
        let ran = Arc::new(Mutex::new(0));
        let (a, c) = (Arc::clone(&ran), Arc::clone(&ran));
        let action = Action::from_async(move || {
            let a = Arc::clone(&a);
            async move {
                tokio::task::yield_now().await;
                *a.lock().unwrap() += 1;
            }
        });
        let callback = Callback::from_async(move || {
            let c = Arc::clone(&c);
            async move { *c.lock().unwrap() += 1 }
        });

        assert!(action.is_async());
        assert!(callback.is_async());
        action.invoke(None).await.unwrap();
        callback.invoke().await.unwrap();
        assert_eq!(*ran.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn async_action_with_arg_propagates_errors() {
        let action = Action::with_arg_async(|n: u32| async move {
            if n > 3 {
                Err(Busy)
            } else {
                Ok(())
            }
        });

        assert!(action.invoke(Some(Box::new(1u32))).await.is_ok());
        assert!(action.invoke(Some(Box::new(9u32))).await.is_err());
    }

    #[tokio::test]
    async fn none_action_is_a_no_op() {
        let action = Action::default();

        assert!(action.is_none());
        assert!(action.argument_type().is_none());
        assert!(action.invoke(None).await.is_ok());
    }
}
