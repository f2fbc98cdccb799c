use std::time::Duration;

use thiserror::Error;

/// A token sequence that names nothing in the command tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no command named `{name}`")]
pub struct CommandNotFound {
    pub name: String,
}

/// Structural problems in the command tree, found while registering.
///
/// These are programming errors in a command plugin and abort startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("`{trigger}` is already registered in container `{container}`")]
    Conflict { container: String, trigger: String },
    #[error("invalid command name `{0}`: names must be non-empty and contain no whitespace")]
    InvalidName(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("missing required argument `{name}`")]
    Missing { name: String },
    #[error("invalid value `{token}` for argument `{name}`")]
    Invalid { name: String, token: String },
}

/// Why a resolved invocation ended in the `Failed` state.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("store unavailable: {0:#}")]
    StoreUnavailable(#[source] anyhow::Error),
    #[error("command is on cooldown for another {retry_after:?}")]
    CooldownActive { retry_after: Duration },
    #[error("missing required argument `{name}`")]
    MissingArgument { name: String },
    #[error("invalid value `{token}` for argument `{name}`")]
    InvalidArgumentValue { name: String, token: String },
    #[error("command handler failed: {0:#}")]
    HandlerExecution(#[source] anyhow::Error),
    #[error("command handler exceeded its {after:?} deadline")]
    HandlerTimeout { after: Duration },
    #[error("failed to deliver reply: {0:#}")]
    Delivery(#[source] anyhow::Error),
}

impl From<ArgumentError> for DispatchError {
    fn from(error: ArgumentError) -> Self {
        match error {
            ArgumentError::Missing { name } => Self::MissingArgument { name },
            ArgumentError::Invalid { name, token } => Self::InvalidArgumentValue { name, token },
        }
    }
}
