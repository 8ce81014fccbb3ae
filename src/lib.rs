//! Liquid FSM: an embeddable finite state machine runtime
//!
//! A machine is built from a configuration table that maps every state to its
//! entry and exit callbacks and to the triggers it accepts. Firing a trigger
//! looks up the record for the current state, evaluates its guard, resolves
//! the target and runs exit, action and entry callbacks in that order before
//! the new state is committed.
//!
//! # Core Concepts
//!
//! - **Configuration**: the state table, filled through
//!   [`builder::Configuration::configure`]
//! - **Guards**: predicates, sync or async, gating a transition
//! - **Dynamic targets**: transitions whose target is computed at fire time
//! - **Parameterized triggers**: triggers that carry a typed argument to their
//!   action
//! - **Machines**: five variants sharing one executor and differing in how
//!   they serialize callers, see [`machine`]
//!
//! # Example
//!
//! ```rust
//! use liquid_fsm::builder::Configuration;
//! use liquid_fsm::core::ParameterizedTrigger;
//! use liquid_fsm::machine::StateMachine;
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
//! enum Phone {
//!     Off,
//!     Ringing,
//!     Connected,
//! }
//!
//! #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
//! enum Call {
//!     Ring,
//!     Connect,
//!     HangUp,
//! }
//!
//! let caller = Arc::new(Mutex::new(String::new()));
//! let connect = ParameterizedTrigger::<Call, String>::new(Call::Connect);
//!
//! let mut config = Configuration::new();
//! config.configure(Phone::Off).permit(Call::Ring, Phone::Ringing)?;
//! let sink = Arc::clone(&caller);
//! config
//!     .configure(Phone::Ringing)
//!     .permit_parameterized(&connect, Phone::Connected, move |name: String| {
//!         *sink.lock().unwrap() = name;
//!     })?
//!     .ignore(Call::Ring)?;
//! config.configure(Phone::Connected).permit(Call::HangUp, Phone::Off)?;
//!
//! let phone = StateMachine::new(config, Phone::Off)?;
//! phone.fire(Call::Ring)?;
//! phone.fire(Call::Ring)?;
//! phone.fire_with(&connect, "John Doe".to_string())?;
//!
//! assert_eq!(phone.current_state(), Phone::Connected);
//! assert_eq!(*caller.lock().unwrap(), "John Doe");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use builder::{Configuration, ConfigurationError, MachineBuilder};
pub use core::{DynamicState, Guard, ParameterizedTrigger, State, StateHistory, Trigger};
pub use machine::{
    AwaitableStateMachine, BlockingStateMachine, QueuedStateMachine, ScheduledStateMachine,
    StateMachine, TransitionError,
};
