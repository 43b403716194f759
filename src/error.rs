//! Crate-level error type.
//!
//! Only one failure is part of the session protocol itself: an operation that
//! names a session the store does not know. Code execution failures are not
//! errors; they come back as an [`ExecutionResult`](crate::session::ExecutionResult)
//! with `success == false`. The remaining variants cover the CLI's ambient
//! concerns (configuration loading and terminal I/O).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollabError {
    /// The session id is unknown to the store.
    #[error("Session not found: {session_id}")]
    NotFound { session_id: String },

    /// A language key that is not part of the supported set.
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// A create or join form was submitted with a blank required field.
    #[error("Invalid form: {0}")]
    InvalidForm(&'static str),

    /// The configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollabError {
    pub fn not_found(session_id: impl Into<String>) -> Self {
        Self::NotFound {
            session_id: session_id.into(),
        }
    }

    /// True for the session-protocol failure (as opposed to ambient errors).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, CollabError>;
