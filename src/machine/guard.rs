//! Non-reentrant exclusion guard around transition execution.
//!
//! This is a try-acquire flag, not a queue: a second caller is turned away
//! instead of waiting.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub(crate) struct TransitionGuard {
    busy: AtomicBool,
}

/// Held while a transition runs. Dropping it releases the guard on every
/// exit path, including errors, panics and cancelled futures.
#[must_use]
pub(crate) struct GuardToken<'a> {
    guard: &'a TransitionGuard,
}

impl TransitionGuard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn try_acquire(&self) -> Option<GuardToken<'_>> {
        self.try_lock().then_some(GuardToken { guard: self })
    }

    /// Acquire without a token. The caller must pair it with `unlock`.
    pub(crate) fn try_lock(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub(crate) fn unlock(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub(crate) fn is_held(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let guard = TransitionGuard::new();
        let token = guard.try_acquire();

        assert!(token.is_some());
        assert!(guard.is_held());
        assert!(guard.try_acquire().is_none());
    }

    #[test]
    fn dropping_token_releases() {
        let guard = TransitionGuard::new();
        drop(guard.try_acquire());

        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn release_happens_on_panic() {
        let guard = TransitionGuard::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _token = guard.try_acquire();
            panic!("callback failed");
        }));

        assert!(result.is_err());
        assert!(!guard.is_held());
    }
}
