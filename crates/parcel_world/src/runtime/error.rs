//! Failure taxonomy for command dispatch.

use serde::{Deserialize, Serialize};

/// Declared outcomes of one dispatch invocation.
///
/// Everything except [`CommandFault`](DispatchError::CommandFault) is
/// an expected outcome carrying a specific localized message key.
/// `CommandFault` is recovered at the dispatcher boundary, logged, and
/// reported generically; it never escapes and never skips scope
/// restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum DispatchError {
    /// Scope-switch relocation refused by the world engine.
    BorderDenied,
    /// Unrecognized leading dash argument.
    InvalidFlag { flag: String },
    /// Economy gate: the actor cannot afford the priced command.
    InsufficientFunds { price: f64, balance: f64 },
    /// `confirm` invoked with nothing pending.
    NoConfirmationPending,
    /// Capability check failed.
    PermissionDenied { capability: String },
    /// No command node matched the input tokens.
    UnknownCommand { input: String },
    /// Unexpected internal fault during execution.
    CommandFault { message: Option<String> },
}

impl DispatchError {
    pub fn message_key(&self) -> &'static str {
        match self {
            DispatchError::BorderDenied => "border.denied",
            DispatchError::InvalidFlag { .. } => "errors.invalid_command_flag",
            DispatchError::InsufficientFunds { .. } => "economy.cannot_afford_command",
            DispatchError::NoConfirmationPending => "confirm.failed",
            DispatchError::PermissionDenied { .. } => "permission.no_permission_event",
            DispatchError::UnknownCommand { .. } => "commands.not_valid_subcommand",
            DispatchError::CommandFault { message } => match message {
                Some(_) => "errors.error",
                None => "errors.error_console",
            },
        }
    }
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::BorderDenied => write!(f, "relocation denied at region border"),
            DispatchError::InvalidFlag { flag } => write!(f, "invalid command flag -{flag}"),
            DispatchError::InsufficientFunds { price, balance } => {
                write!(f, "insufficient funds: price {price}, balance {balance}")
            }
            DispatchError::NoConfirmationPending => write!(f, "no confirmation pending"),
            DispatchError::PermissionDenied { capability } => {
                write!(f, "missing capability {capability}")
            }
            DispatchError::UnknownCommand { input } => write!(f, "unknown command {input:?}"),
            DispatchError::CommandFault { message } => match message {
                Some(detail) => write!(f, "command fault: {detail}"),
                None => write!(f, "command fault"),
            },
        }
    }
}

impl std::error::Error for DispatchError {}
