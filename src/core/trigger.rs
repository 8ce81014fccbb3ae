//! Triggers carrying a typed argument.

use std::marker::PhantomData;

/// A trigger value paired with the type of the argument it carries.
///
/// Created once and reused at both configuration time (to type the action)
/// and fire time (to type the argument). Exclusivity of `permit`/`ignore`
/// is keyed on the underlying trigger, not on the argument type.
///
/// # Example
///
/// ```rust
/// use liquid_fsm::core::ParameterizedTrigger;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Call {
///     Connect,
/// }
///
/// let connect = ParameterizedTrigger::<_, String>::new(Call::Connect);
/// assert_eq!(connect.trigger(), &Call::Connect);
/// ```
pub struct ParameterizedTrigger<T, A> {
    trigger: T,
    _argument: PhantomData<fn(A)>,
}

impl<T, A> ParameterizedTrigger<T, A> {
    pub fn new(trigger: T) -> Self {
        Self {
            trigger,
            _argument: PhantomData,
        }
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }
}

impl<T: Clone, A> Clone for ParameterizedTrigger<T, A> {
    fn clone(&self) -> Self {
        Self::new(self.trigger.clone())
    }
}

impl<T: std::fmt::Debug, A> std::fmt::Debug for ParameterizedTrigger<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterizedTrigger")
            .field("trigger", &self.trigger)
            .field("argument", &std::any::type_name::<A>())
            .finish()
    }
}
