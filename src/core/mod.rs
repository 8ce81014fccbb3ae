//! Core value types of the transition engine.
//!
//! This module contains the building blocks the configuration table is made
//! of:
//! - State and trigger bounds via the `State` and `Trigger` traits
//! - Guard predicates, callbacks and actions in sync and async shapes
//! - Dynamic targets and parameterized triggers
//! - Bounded transition history

mod action;
mod dynamic;
mod guard;
mod history;
mod representation;
mod state;
mod trigger;

pub use action::{
    Action, Argument, ArgumentType, Callback, CallbackError, CallbackOutput, CallbackResult,
};
pub use dynamic::{DynamicState, DynamicTarget};
pub use guard::Guard;
pub use history::{StateHistory, StateTransition};
pub use representation::{StateRepresentation, Target, TriggerRepresentation};
pub use state::{State, Trigger};
pub use trigger::ParameterizedTrigger;
