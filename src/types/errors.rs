//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the steward agent.
///
/// Only `Configuration` and `Connection` abort the session lifecycle; every
/// other variant is caught at the `send_message` boundary and surfaced as a
/// single user-facing error while the session stays usable.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing credential or missing tool-host configuration (fatal to initialize).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Tool-host transport unreachable (fatal to initialize).
    #[error("connection error: {0}")]
    Connection(String),

    /// No tool could be selected and no default-tool policy applies.
    #[error("tool selection error: {0}")]
    ToolSelection(String),

    /// Argument/schema mismatch (recovered locally, never surfaced directly).
    #[error("validation error: {0}")]
    Validation(String),

    /// Tool host call failed or returned malformed data.
    #[error("tool invocation error: {0}")]
    ToolInvocation(String),

    /// Completion provider failed while grounding a response.
    #[error("generation error: {0}")]
    Generation(String),

    /// Session used before initialize or after close.
    #[error("agent not initialized")]
    NotInitialized,

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// Convenience constructors
impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn tool_selection(msg: impl Into<String>) -> Self {
        Self::ToolSelection(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn tool_invocation(msg: impl Into<String>) -> Self {
        Self::ToolInvocation(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Whether this error should abort the session lifecycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::Connection(_))
    }
}
