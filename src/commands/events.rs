//! Command execution events

use serde::{Deserialize, Serialize};

/// Name under which [`CommandEvent`]s are published
pub const COMMAND_EXECUTED: &str = "command:executed";

/// Emitted exactly once per handled command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Canonical command id (never the alias that was typed)
    pub command: String,
    /// Argument tokens as typed, flags included
    pub args: Vec<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandEvent {
    pub fn name(&self) -> &'static str {
        COMMAND_EXECUTED
    }
}
