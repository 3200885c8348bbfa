//! Error types for hookwatch.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HookwatchError {
    #[error("No sessions found in {}", .0.display())]
    NoSessions(PathBuf),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(
        "Ambiguous session prefix '{prefix}' matches {} sessions:\n  {}",
        candidates.len(),
        candidates.join("\n  ")
    )]
    AmbiguousSession {
        prefix: String,
        candidates: Vec<String>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
