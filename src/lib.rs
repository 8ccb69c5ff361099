//! expander - A system-wide text snippet expander.
//!
//! When a delimiter key (space, return or tab) is typed, the line around the
//! caret in the focused text field is rewritten by replacing every trigger
//! from the snippet table with its expansion.

pub mod cli;
pub mod commands;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod expansion;
pub mod focus;
pub mod keyboard;
pub mod line;
pub mod listener;
pub mod mirror;
pub mod models;
pub mod storage;
pub mod watch;

// Re-export
pub use cli::{Commands, ExpanderCli};
pub use commands::handle_command;
pub use config::{get_config_dir, is_daemon_running};
pub use daemon::{daemon_status, run_daemon_worker, start_daemon, stop_daemon};
pub use engine::{plan_edit, Expander, ExpanderState, LineEdit, Outcome};
pub use error::{ExpanderError, Result};
pub use expansion::{expand, Expansion};
pub use focus::{FocusSnapshot, FocusedText, TextField};
pub use line::{locate_line, LineSpan, Selection, TextBuffer};
pub use mirror::{KeystrokeMirror, KeystrokeSink};
pub use models::{SharedTable, Snippet, SnippetTable};
pub use storage::{SnippetStore, TableSource};
pub use watch::SnippetWatcher;
