//! Builder API for state tables and machines.
//!
//! A [`Configuration`] is filled state by state through [`StateConfiguration`]
//! and then handed to a [`MachineBuilder`], which picks the machine flavor.
//! Conflicting registrations are reported as [`ConfigurationError`] at the
//! point they are made.

mod configuration;
mod error;
mod machine;
mod transition;

pub use configuration::{Configuration, StateConfiguration};
pub use error::ConfigurationError;
pub use machine::MachineBuilder;
pub use transition::TransitionBuilder;
