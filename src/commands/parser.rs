//! Command-line parsing for prefixed input
//!
//! `/search tokio spawn --limit=5 --type=code` parses to the name `search`,
//! positional arguments `["tokio", "spawn"]` and the options
//! `limit = "5"`, `type = "code"`. A bare `--flag` is a boolean option.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Value of a `--` option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// `--flag`
    Flag,
    /// `--key=value`
    Value(String),
}

/// A prefixed input line split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Case-folded command name, without the prefix
    pub name: String,
    /// Positional arguments in order
    pub args: Vec<String>,
    /// Options keyed by lower-case name (`_` normalized to `-`)
    pub options: BTreeMap<String, OptionValue>,
    /// Every token after the command name, flags included
    pub raw_args: Vec<String>,
}

impl ParsedCommand {
    /// Whether an option was given, with or without a value
    pub fn flag(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Value of a `--key=value` option
    pub fn value(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(OptionValue::Value(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Parse a positive integer option.
    ///
    /// A bare flag, a non-numeric value or zero is a [`Error::Parse`].
    pub fn usize_option(&self, name: &str) -> Result<Option<usize>> {
        match self.options.get(name) {
            None => Ok(None),
            Some(OptionValue::Flag) => Err(Error::Parse(format!("--{} requires a value", name))),
            Some(OptionValue::Value(v)) => match v.parse::<usize>() {
                Ok(0) => Err(Error::Parse(format!("--{} must be positive", name))),
                Ok(n) => Ok(Some(n)),
                Err(_) => Err(Error::Parse(format!(
                    "--{} expects a number, got '{}'",
                    name, v
                ))),
            },
        }
    }

    /// Positional arguments joined by single spaces
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }
}

/// Parse `input` as a command if it starts with `prefix`.
///
/// Returns `None` for non-command input and for a bare prefix.
pub fn parse_input(prefix: char, input: &str) -> Option<ParsedCommand> {
    let body = input.strip_prefix(prefix)?;
    let mut tokens = body.split_whitespace();
    let name = tokens.next()?.to_lowercase();

    let mut args = Vec::new();
    let mut options = BTreeMap::new();
    let mut raw_args = Vec::new();

    for token in tokens {
        raw_args.push(token.to_string());
        match token.strip_prefix("--").filter(|rest| !rest.is_empty()) {
            Some(rest) => {
                let (key, value) = match rest.split_once('=') {
                    Some((key, value)) => (key, OptionValue::Value(value.to_string())),
                    None => (rest, OptionValue::Flag),
                };
                options.insert(key.to_lowercase().replace('_', "-"), value);
            }
            None => args.push(token.to_string()),
        }
    }

    Some(ParsedCommand {
        name,
        args,
        options,
        raw_args,
    })
}
