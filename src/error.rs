//! Curator error types

use thiserror::Error;

/// Curator error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed command input or option value
    #[error("Parse error: {0}")]
    Parse(String),

    /// Store query, insert or delete failure
    #[error("Store error: {0}")]
    Store(String),

    /// Content analyzer failure
    #[error("Analyzer error: {0}")]
    Analyzer(String),

    /// Every search strategy in the chain failed
    #[error("Search error: {0}")]
    Search(String),

    /// Artifact construction or validation error
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML decoding error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Curator operations
pub type Result<T> = std::result::Result<T, Error>;
