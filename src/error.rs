//! Error types for CodeChat
//!
//! This module defines all error types used throughout the workspace,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for CodeChat operations
///
/// Every variant is recoverable: the workspace reports it to the user as a
/// notice and the session keeps running.
#[derive(Error, Debug)]
pub enum CodeChatError {
    /// Requested language id is not part of the catalog
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// A run was requested while another one is still in flight
    #[error("An execution is already running")]
    AlreadyRunning,

    /// Chat message was empty after trimming whitespace
    #[error("Message cannot be empty")]
    EmptyMessage,

    /// Source failed to compile in a real execution backend
    #[error("Compile error: {0}")]
    CompileError(String),

    /// Program exited unsuccessfully in a real execution backend
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    /// Program exceeded the configured execution deadline
    #[error("Execution timed out after {seconds}s")]
    Timeout {
        /// The deadline that was exceeded
        seconds: u64,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CodeChatError {
    /// Short user-facing title for this error kind
    pub fn title(&self) -> &'static str {
        match self {
            Self::UnknownLanguage(_) => "Unknown Language",
            Self::AlreadyRunning => "Already Running",
            Self::EmptyMessage => "Empty Message",
            Self::CompileError(_) => "Compile Error",
            Self::RuntimeError(_) => "Runtime Error",
            Self::Timeout { .. } => "Timeout",
            Self::Config(_) => "Configuration Error",
            Self::Storage(_) | Self::Io(_) | Self::Serialization(_) | Self::Yaml(_) => {
                "Storage Error"
            }
        }
    }
}

/// Result type alias for CodeChat operations
///
/// Uses `anyhow::Error` so callers can attach context; downcast to
/// [`CodeChatError`] to inspect the kind.
pub type Result<T> = anyhow::Result<T>;

/// Returns the [`CodeChatError`] carried by an `anyhow::Error`, if any
pub fn error_kind(err: &anyhow::Error) -> Option<&CodeChatError> {
    err.downcast_ref::<CodeChatError>()
}
