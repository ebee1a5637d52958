//! Command outcome delivered to correlation waiters
//!
//! A command that executed but failed logically (invalid target, bad
//! syntax) is still a *fulfilled* outcome, distinguished by `success`, so
//! a sequential caller awaiting one command is never thrown for a command
//! the engine actually ran.

use serde_json::Value;

use crate::messages::CommandResponse;

/// Result of one command round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    /// `status_code == 0` on the wire
    pub success: bool,
    pub status_code: i32,
    pub status_message: Option<String>,
    /// Full response body, including command-specific fields
    pub body: Value,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl From<CommandResponse> for CommandOutcome {
    fn from(response: CommandResponse) -> Self {
        Self {
            success: response.status_code == 0,
            status_code: response.status_code,
            status_message: response.status_message,
            body: response.body,
        }
    }
}
