//! Dynamically resolved transition targets.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

/// Target state computed at fire time.
///
/// `can_transition == false` rejects the trigger the same way a failed
/// guard does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicState<S> {
    pub state: S,
    pub can_transition: bool,
}

impl<S> DynamicState<S> {
    /// A resolution that permits the transition.
    pub fn new(state: S) -> Self {
        Self {
            state,
            can_transition: true,
        }
    }

    /// A resolution that rejects the trigger.
    pub fn rejected(state: S) -> Self {
        Self {
            state,
            can_transition: false,
        }
    }
}

type SyncResolver<S> = Arc<dyn Fn() -> DynamicState<S> + Send + Sync>;
type AsyncResolver<S> = Arc<dyn Fn() -> BoxFuture<'static, DynamicState<S>> + Send + Sync>;

/// Resolver producing a [`DynamicState`].
///
/// Resolvers are also invoked speculatively by `can_handle`, so they share
/// the purity expectation of guards.
pub enum DynamicTarget<S> {
    Sync(SyncResolver<S>),
    Async(AsyncResolver<S>),
}

impl<S: Send + 'static> DynamicTarget<S> {
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn() -> DynamicState<S> + Send + Sync + 'static,
    {
        DynamicTarget::Sync(Arc::new(resolver))
    }

    pub fn from_async<F, Fut>(resolver: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DynamicState<S>> + Send + 'static,
    {
        DynamicTarget::Async(Arc::new(move || resolver().boxed()))
    }

    pub async fn resolve(&self) -> DynamicState<S> {
        match self {
            DynamicTarget::Sync(resolver) => resolver(),
            DynamicTarget::Async(resolver) => resolver().await,
        }
    }
}

impl<S> DynamicTarget<S> {
    pub fn is_async(&self) -> bool {
        matches!(self, DynamicTarget::Async(_))
    }
}

impl<S> Clone for DynamicTarget<S> {
    fn clone(&self) -> Self {
        match self {
            DynamicTarget::Sync(resolver) => DynamicTarget::Sync(Arc::clone(resolver)),
            DynamicTarget::Async(resolver) => DynamicTarget::Async(Arc::clone(resolver)),
        }
    }
}

impl<S> std::fmt::Debug for DynamicTarget<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DynamicTarget::Sync(_) => f.write_str("DynamicTarget::Sync"),
            DynamicTarget::Async(_) => f.write_str("DynamicTarget::Async"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_resolution_disallows_transition() {
        let resolution = DynamicState::rejected("Busy");

        assert!(!resolution.can_transition);
        assert_eq!(resolution.state, "Busy");
    }

    #[tokio::test]
    async fn sync_resolver_needs_no_executor() {
        let target = DynamicTarget::new(|| DynamicState::new(3u8));

        assert!(!target.is_async());
        assert_eq!(target.resolve().await, DynamicState::new(3));
    }

    #[tokio::test]
    async fn async_resolver_is_awaited() {
        let target = DynamicTarget::from_async(|| async { DynamicState::new('b') });

        assert!(target.is_async());
        assert_eq!(target.resolve().await.state, 'b');
    }
}
