//! Command layer
//!
//! Parses prefixed input, resolves it against the [`CommandRegistry`] and
//! runs the bound [`CommandHandler`] with the session's state. Every handled
//! command publishes one [`CommandEvent`].

pub mod dispatcher;
pub mod events;
pub mod handlers;
pub mod parser;
pub mod registry;
pub mod session;

pub use dispatcher::{CommandDispatcher, CommandExecution};
pub use events::{CommandEvent, COMMAND_EXECUTED};
pub use handlers::{
    builtin_commands, CommandContext, CommandHandler, CommandOutcome, CommandRequest,
    DeletedArtifact, StatsReport,
};
pub use parser::{parse_input, OptionValue, ParsedCommand};
pub use registry::{CommandRegistration, CommandRegistry, HelpEntry};
pub use session::SessionStats;
