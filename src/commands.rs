use crate::cli::Commands;
use crate::daemon::{daemon_status, run_daemon_worker, start_daemon, stop_daemon};
use crate::engine::{Expander, Outcome};
use crate::error::{ExpanderError, Result};
use crate::focus::TextField;
use crate::models::{SharedTable, SnippetTable};
use crate::storage::SnippetStore;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn handle_command(command: Option<Commands>, snippets: Option<PathBuf>) -> Result<()> {
    let store = match snippets {
        Some(path) => SnippetStore::new(absolute_path(path)?),
        None => SnippetStore::at_default_location(),
    };

    match command {
        Some(command) => handle_subcommand(command, &store),
        None => daemon_status(&store), // Default: show status when no command provided
    }
}

fn handle_subcommand(command: Commands, store: &SnippetStore) -> Result<()> {
    match command {
        Commands::Run => run_daemon_worker(store),
        Commands::Start => start_daemon(store),
        Commands::Stop => stop_daemon(),
        Commands::Status => daemon_status(store),
        Commands::List { json } => handle_list(store, json),
        Commands::Add { trigger, expansion } => store
            .add(&trigger, &expansion)
            .map(|_| println!("Snippet added successfully")),
        Commands::Update { trigger, expansion } => store
            .update(&trigger, &expansion)
            .map(|_| println!("Snippet updated successfully")),
        Commands::Delete { trigger } => store
            .delete(&trigger)
            .map(|_| println!("Snippet deleted successfully")),
        Commands::Edit => handle_edit(store),
        Commands::Expand { text, cursor } => handle_expand(store, &text, cursor),
        Commands::DaemonWorker => run_daemon_worker(store),
    }
}

// The daemon changes its working directory, so relative paths are resolved up front
fn absolute_path(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn handle_list(store: &SnippetStore, json: bool) -> Result<()> {
    let (table, _) = store.load_or_default();
    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        print!("{}", format_listing(&table));
    }
    Ok(())
}

/// One `trigger → expansion` row per snippet, sorted by trigger
pub fn format_listing(table: &SnippetTable) -> String {
    let width = table
        .iter()
        .map(|snippet| snippet.trigger.chars().count())
        .max()
        .unwrap_or(0);

    table
        .sorted()
        .into_iter()
        .map(|snippet| format!("{:<width$}  →  {}\n", snippet.trigger, snippet.expansion))
        .collect()
}

/// Run one expansion attempt against an in-memory field
pub fn dry_run(table: SnippetTable, text: &str, cursor: Option<usize>) -> (TextField, Outcome) {
    let mut field = match cursor {
        Some(offset) => TextField::with_caret(text, offset),
        None => TextField::new(text),
    };
    let expander = Expander::new(SharedTable::new(table));
    let outcome = expander.on_delimiter(&mut field);
    (field, outcome)
}

fn handle_expand(store: &SnippetStore, text: &str, cursor: Option<usize>) -> Result<()> {
    let (table, _) = store.load_or_default();
    let (field, outcome) = dry_run(table, text, cursor);

    match outcome {
        Outcome::Expanded(edit) => {
            println!("{}", field.text());
            println!("caret: {}", edit.caret);
        }
        _ => {
            println!("{}", field.text());
            println!("(no snippet matched)");
        }
    }
    Ok(())
}

fn handle_edit(store: &SnippetStore) -> Result<()> {
    store.ensure_exists()?;
    let path = store.path();
    println!("Opening {}", path.display());

    let status = match env::var("EDITOR") {
        Ok(editor) if !editor.trim().is_empty() => Command::new(editor.trim()).arg(path).status(),
        _ => open_with_platform_opener(path),
    };

    match status {
        Ok(exit_status) if exit_status.success() => Ok(()),
        Ok(exit_status) => Err(ExpanderError::Other(format!(
            "Failed to open editor: process exited with code {:?}",
            exit_status.code()
        ))),
        Err(e) => Err(ExpanderError::Io(e)),
    }
}

fn open_with_platform_opener(path: &Path) -> std::io::Result<std::process::ExitStatus> {
    #[cfg(target_os = "macos")]
    let status = Command::new("open").arg("-t").arg(path).status();

    #[cfg(target_os = "windows")]
    let status = Command::new("notepad").arg(path).status();

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let status = Command::new("xdg-open").arg(path).status();

    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::Selection;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_listing_is_sorted_and_aligned() {
        let table: SnippetTable = [("brb", "be right back"), (":x:", "y")].into_iter().collect();
        assert_eq!(format_listing(&table), ":x:  →  y\nbrb  →  be right back\n");
    }

    #[test]
    fn test_dry_run_expands_current_line() {
        let (field, outcome) = dry_run(SnippetTable::defaults(), "hello :smile: world", None);

        assert!(matches!(outcome, Outcome::Expanded(_)));
        assert_eq!(field.text(), "hello 😄 world");
        assert_eq!(field.selection(), Some(Selection::caret(14)));
    }

    #[test]
    fn test_dry_run_respects_cursor_line() {
        let (field, outcome) = dry_run(SnippetTable::defaults(), ":fire:\nplain", Some(9));

        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(field.text(), ":fire:\nplain");
    }

    #[test]
    fn test_relative_paths_are_made_absolute() {
        let path = absolute_path(PathBuf::from("snippets")).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("snippets"));
    }
}
