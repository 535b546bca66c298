//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors raised while building or rewriting a frame tree
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Malformed sample record: {0}")]
    MalformedRecord(String),

    #[error("Invalid tree operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid file path pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Errors that can occur while reading or writing files
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to read file: {0}")]
    ReadFailed(std::io::Error),

    #[error("Failed to write file: {0}")]
    WriteFailed(std::io::Error),

    #[error("Failed to (de)serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that can occur while loading processor configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
}
