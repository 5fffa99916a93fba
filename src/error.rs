//! Error types for Chatline
//!
//! This module defines the error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Chatline operations
///
/// Covers configuration loading, backend communication and the
/// interactive terminal. Backend errors raised inside a chat session are
/// contained by the session controller and never reach the message store.
#[derive(Error, Debug)]
pub enum ChatlineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend could not be reached or refused the request
    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend answered with a non-success HTTP status
    #[error("Backend returned status {status}: {body}")]
    BackendStatus {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Backend answered with a body that could not be decoded
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    /// Input rejected before reaching the backend
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The session worker is no longer running
    #[error("Chat session is closed")]
    SessionClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Line editor errors
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Result type alias for Chatline operations
///
/// Uses `anyhow::Error` so callers get rich context while library code
/// still raises typed [`ChatlineError`] values that can be downcast.
pub type Result<T> = anyhow::Result<T>;
