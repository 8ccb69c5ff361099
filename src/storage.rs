//! Snippet file handling.
//!
//! The file holds one `trigger=expansion` pair per line. Blank lines and
//! lines starting with `#`, `//` or `;` are ignored, the first `=` splits the
//! pair, and both sides are trimmed.

use crate::config::get_snippets_file_path;
use crate::error::{ExpanderError, Result};
use crate::models::SnippetTable;
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const COMMENT_PREFIXES: [&str; 3] = ["#", "//", ";"];

/// Where the active table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    File,
    Defaults,
}

/// Split a single line into trigger and expansion
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || COMMENT_PREFIXES.iter().any(|p| line.starts_with(*p)) {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Line separators recognised in the snippet file. `\r\n` counts as one.
pub fn is_newline(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split text into lines, each keeping its terminator
fn lines_with_endings(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_newline(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(next, '\n')) = chars.peek() {
                end = next + 1;
                chars.next();
            }
        }
        lines.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn line_ending(line: &str) -> &str {
    let content = line.trim_end_matches(is_newline);
    &line[content.len()..]
}

/// Parse the snippet file format into a table, in file order
pub fn parse_snippets(text: &str) -> SnippetTable {
    lines_with_endings(text.trim_start_matches('\u{feff}'))
        .into_iter()
        .filter_map(parse_line)
        .collect()
}

/// Render a table in the snippet file format
pub fn render_snippets(table: &SnippetTable) -> String {
    table
        .iter()
        .map(|snippet| format!("{}={}\n", snippet.trigger, snippet.expansion))
        .collect()
}

fn validate_snippet(trigger: &str, expansion: &str) -> Result<()> {
    let has_line_break = |s: &str| s.contains(is_newline);

    if trigger.is_empty() {
        return Err(ExpanderError::InvalidSnippet(
            "trigger must not be empty".to_string(),
        ));
    }
    if trigger.contains('=') {
        return Err(ExpanderError::InvalidSnippet(format!(
            "trigger '{}' must not contain '='",
            trigger
        )));
    }
    if COMMENT_PREFIXES.iter().any(|p| trigger.starts_with(*p)) {
        return Err(ExpanderError::InvalidSnippet(format!(
            "trigger '{}' would be read as a comment",
            trigger
        )));
    }
    if has_line_break(trigger) || has_line_break(expansion) {
        return Err(ExpanderError::InvalidSnippet(
            "snippets must fit on a single line".to_string(),
        ));
    }
    Ok(())
}

/// File-backed snippet store
#[derive(Debug, Clone)]
pub struct SnippetStore {
    path: PathBuf,
}

impl SnippetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.expander/snippets`
    pub fn at_default_location() -> Self {
        Self::new(get_snippets_file_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl ToString) -> ExpanderError {
        ExpanderError::StoreUnavailable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Write the default snippets if the file does not exist yet.
    /// Returns true when the file was created.
    pub fn ensure_exists(&self) -> Result<bool> {
        if self.path.exists() {
            debug!("Snippets file exists at {}", self.path.display());
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, render_snippets(&SnippetTable::defaults()))?;
        info!("Created default snippets file at {}", self.path.display());
        Ok(true)
    }

    /// Read and parse the snippet file
    pub fn load(&self) -> Result<SnippetTable> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(parse_snippets(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(self.unavailable("file not found")),
            Err(e) => Err(self.unavailable(e)),
        }
    }

    /// Load the file, falling back to the built-in defaults when the file
    /// cannot be created or read, or holds no entries.
    pub fn load_or_default(&self) -> (SnippetTable, TableSource) {
        if let Err(e) = self.ensure_exists() {
            warn!(
                "Failed to create default snippets file at {}: {}",
                self.path.display(),
                e
            );
            return (SnippetTable::defaults(), TableSource::Defaults);
        }

        match self.load() {
            Ok(table) if !table.is_empty() => {
                info!("Loaded {} snippets from {}", table.len(), self.path.display());
                (table, TableSource::File)
            }
            Ok(_) => {
                info!(
                    "No snippets found in {}; using defaults",
                    self.path.display()
                );
                (SnippetTable::defaults(), TableSource::Defaults)
            }
            Err(e) => {
                warn!("{}; using default snippets", e);
                (SnippetTable::defaults(), TableSource::Defaults)
            }
        }
    }

    /// Append a new snippet
    pub fn add(&self, trigger: &str, expansion: &str) -> Result<()> {
        let trigger = trigger.trim();
        let expansion = expansion.trim();
        validate_snippet(trigger, expansion)?;

        self.ensure_exists()?;
        let text = fs::read_to_string(&self.path)?;
        if parse_snippets(&text).contains(trigger) {
            return Err(ExpanderError::DuplicateTrigger(trigger.to_string()));
        }

        let mut file = fs::OpenOptions::new().append(true).open(&self.path)?;
        if !text.is_empty() && !text.ends_with(is_newline) {
            writeln!(file)?;
        }
        writeln!(file, "{}={}", trigger, expansion)?;
        Ok(())
    }

    /// Replace the expansion of an existing snippet
    pub fn update(&self, trigger: &str, expansion: &str) -> Result<()> {
        let trigger = trigger.trim();
        let expansion = expansion.trim();
        validate_snippet(trigger, expansion)?;

        let replacement = format!("{}={}", trigger, expansion);
        self.rewrite_definitions(trigger, Some(&replacement))
    }

    /// Remove every line defining `trigger`
    pub fn delete(&self, trigger: &str) -> Result<()> {
        self.rewrite_definitions(trigger.trim(), None)
    }

    fn rewrite_definitions(&self, trigger: &str, replacement: Option<&str>) -> Result<()> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ExpanderError::TriggerNotFound(trigger.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut found = false;
        let mut output = String::with_capacity(text.len());
        for line in lines_with_endings(&text) {
            let defines_trigger = matches!(parse_line(line), Some((key, _)) if key == trigger);
            if !defines_trigger {
                output.push_str(line);
                continue;
            }

            found = true;
            if let Some(replacement) = replacement {
                output.push_str(replacement);
                output.push_str(line_ending(line));
            }
        }

        if !found {
            return Err(ExpanderError::TriggerNotFound(trigger.to_string()));
        }

        fs::write(&self.path, output)?;
        Ok(())
    }
}
