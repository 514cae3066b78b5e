//! Error types for debug-mode
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// All error types that can occur while orchestrating debug tracks
#[derive(Debug, Error)]
pub enum TrackError {
    /// Track identifier outside the fixed track set
    #[error("Invalid track: {0} (expected track-a or track-b)")]
    InvalidTrack(String),

    /// Prompt file missing or unreadable, checked before any session is touched
    #[error("Prompt file not readable: {}", path.display())]
    PromptUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Session manager call or runner script write failed
    #[error("Session operation '{operation}' failed: {message}")]
    SessionOperationFailed { operation: String, message: String },

    /// Project root is not inside a git work tree
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// Git worktree or branch error
    #[error("Worktree error: {0}")]
    Worktree(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackError {
    /// Build a `SessionOperationFailed` for the named operation
    pub fn session(operation: impl Into<String>, message: impl ToString) -> Self {
        TrackError::SessionOperationFailed {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for debug-mode operations
pub type Result<T> = std::result::Result<T, TrackError>;
