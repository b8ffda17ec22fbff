//! Command registry
//!
//! Maps canonical ids and aliases (case-insensitively) onto registrations.
//! Every name may be claimed once; a collision is rejected when the second
//! registration is added.

use super::handlers::CommandHandler;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A command and the names it answers to
#[derive(Clone)]
pub struct CommandRegistration {
    pub id: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub handler: Arc<dyn CommandHandler>,
}

impl CommandRegistration {
    pub fn new(
        id: impl Into<String>,
        aliases: &[&str],
        description: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            id: id.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            description: description.into(),
            handler,
        }
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

impl std::fmt::Debug for CommandRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistration")
            .field("id", &self.id)
            .field("aliases", &self.aliases)
            .finish()
    }
}

/// One line of the help listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpEntry {
    pub command: String,
    pub aliases: Vec<String>,
    pub description: String,
}

/// Registry of commands, in registration order
#[derive(Debug, Default)]
pub struct CommandRegistry {
    registrations: Vec<CommandRegistration>,
    names: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration. Fails if any of its names is already taken.
    pub fn register(&mut self, registration: CommandRegistration) -> Result<()> {
        let mut claimed: Vec<String> = Vec::new();
        for name in registration.names() {
            let key = name.to_lowercase();
            if key.is_empty() || key.chars().any(char::is_whitespace) {
                return Err(Error::Config(format!(
                    "invalid command name '{}' for '{}'",
                    name, registration.id
                )));
            }
            if let Some(&existing) = self.names.get(&key) {
                return Err(Error::Config(format!(
                    "command name '{}' of '{}' is already registered by '{}'",
                    key, registration.id, self.registrations[existing].id
                )));
            }
            if claimed.contains(&key) {
                return Err(Error::Config(format!(
                    "command name '{}' is listed twice for '{}'",
                    key, registration.id
                )));
            }
            claimed.push(key);
        }

        let index = self.registrations.len();
        for key in claimed {
            self.names.insert(key, index);
        }
        tracing::debug!(
            command = %registration.id,
            aliases = ?registration.aliases,
            "Registered command"
        );
        self.registrations.push(registration);
        Ok(())
    }

    /// Look up a command by id or alias, ignoring case
    pub fn resolve(&self, name: &str) -> Option<&CommandRegistration> {
        self.names
            .get(&name.to_lowercase())
            .map(|&index| &self.registrations[index])
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn help(&self) -> Vec<HelpEntry> {
        self.registrations
            .iter()
            .map(|r| HelpEntry {
                command: r.id.clone(),
                aliases: r.aliases.clone(),
                description: r.description.clone(),
            })
            .collect()
    }
}
