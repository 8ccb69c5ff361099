use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpanderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Keyboard controller error: {0}")]
    Enigo(String),
    #[error("Keyboard listener error: {0}")]
    Listener(String),
    #[error("Snippet store unavailable at {}: {reason}", path.display())]
    StoreUnavailable { path: PathBuf, reason: String },
    #[error("Invalid snippet: {0}")]
    InvalidSnippet(String),
    #[error("Trigger '{0}' already exists")]
    DuplicateTrigger(String),
    #[error("Trigger '{0}' not found")]
    TriggerNotFound(String),
    #[error("Daemon already running with PID {0}")]
    DaemonAlreadyRunning(u32),
    #[error("Daemon is not running")]
    DaemonNotRunning,
    #[error("Invalid PID in daemon file")]
    InvalidPid,
    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ExpanderError>;
