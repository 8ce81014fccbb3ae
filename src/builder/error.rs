//! Configuration errors raised while building tables and machines.

use thiserror::Error;

/// Errors that can occur when configuring states and creating machines.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Trigger {trigger} is already configured for state {state}. Permit and ignore are exclusive per trigger")]
    ExclusiveOperation { state: String, trigger: String },

    #[error("Configuration has no states. Configure at least one state before creating a machine")]
    EmptyConfiguration,

    #[error("Transition for trigger {trigger} has no target. Call .to(state), .reentry(), .ignore() or .dynamic(resolver)")]
    MissingTarget { trigger: String },

    #[error("State {state} has async callbacks. Use an awaitable, queued or scheduled machine")]
    AsyncCallbackInSyncMachine { state: String },
}
