//! Runs one expansion attempt per delimiter key.

use crate::expansion::{expand, Expansion};
use crate::focus::{FocusSnapshot, FocusedText};
use crate::line::LineSpan;
use crate::models::{SharedTable, SnippetTable};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpanderState {
    Idle,
    Expanding,
}

/// Replacement to apply to the focused field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    pub span: LineSpan,
    pub new_line: String,
    /// Absolute caret offset after the edit
    pub caret: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No readable target, a write failed, or an attempt was already running
    Skipped,
    Unchanged,
    Expanded(LineEdit),
}

/// Work out the edit for a snapshot, if any trigger matches its current line
pub fn plan_edit(snapshot: &FocusSnapshot, table: &SnippetTable) -> Option<LineEdit> {
    let span = snapshot.buffer.line_at(snapshot.cursor());
    let Some(line) = snapshot.buffer.slice_exact(span) else {
        // Rewriting would replace the unpaired surrogates with U+FFFD
        debug!("Current line is not valid UTF-16; leaving it untouched");
        return None;
    };

    match expand(&line, table) {
        Expansion::Unchanged => None,
        Expansion::Replaced {
            new_line,
            new_cursor,
        } => Some(LineEdit {
            span,
            caret: span.start + new_cursor,
            new_line,
        }),
    }
}

/// Connects the focused field to the shared snippet table
#[derive(Debug, Default)]
pub struct Expander {
    table: SharedTable,
    expanding: AtomicBool,
}

struct ExpandingGuard<'a>(&'a AtomicBool);

impl Drop for ExpandingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Expander {
    pub fn new(table: SharedTable) -> Self {
        Self {
            table,
            expanding: AtomicBool::new(false),
        }
    }

    pub fn table(&self) -> &SharedTable {
        &self.table
    }

    pub fn state(&self) -> ExpanderState {
        if self.expanding.load(Ordering::Acquire) {
            ExpanderState::Expanding
        } else {
            ExpanderState::Idle
        }
    }

    /// Handle one delimiter keystroke against `target`
    pub fn on_delimiter<T: FocusedText + ?Sized>(&self, target: &mut T) -> Outcome {
        if self.expanding.swap(true, Ordering::AcqRel) {
            debug!("Delimiter ignored; an expansion is already in progress");
            return Outcome::Skipped;
        }
        let _guard = ExpandingGuard(&self.expanding);

        let Some(snapshot) = target.read_focused_text() else {
            debug!("No focused text field; skipping expansion");
            return Outcome::Skipped;
        };

        let table = self.table.snapshot();
        let Some(edit) = plan_edit(&snapshot, &table) else {
            return Outcome::Unchanged;
        };

        if let Err(e) = target.write_focused_text(edit.span, &edit.new_line) {
            warn!("Failed to write expanded text: {}", e);
            return Outcome::Skipped;
        }
        if let Err(e) = target.set_caret(edit.caret) {
            warn!("Failed to move caret after expansion: {}", e);
        }

        debug!(
            "Expanded line {}..{} to {} code units",
            edit.span.start,
            edit.span.end,
            edit.caret - edit.span.start
        );
        Outcome::Expanded(edit)
    }
}
