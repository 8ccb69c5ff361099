//! Access to the text field that currently has input focus.

use crate::error::{ExpanderError, Result};
use crate::line::{LineSpan, Selection, TextBuffer};

/// Point-in-time copy of the focused field's text and selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusSnapshot {
    pub buffer: TextBuffer,
    pub selection: Option<Selection>,
}

impl FocusSnapshot {
    pub fn new(buffer: TextBuffer, selection: Option<Selection>) -> Self {
        Self { buffer, selection }
    }

    /// Selection start, or the end of the buffer when no selection is known
    pub fn cursor(&self) -> usize {
        self.selection
            .map(|selection| selection.location)
            .unwrap_or_else(|| self.buffer.len())
    }
}

/// Read and write access to the focused text field.
///
/// `None` from `read_focused_text` and any `Err` mean there is nothing to
/// expand; callers skip the attempt rather than report it.
pub trait FocusedText {
    fn read_focused_text(&mut self) -> Option<FocusSnapshot>;

    /// Replace the text covered by `span` with `new_line`
    fn write_focused_text(&mut self, span: LineSpan, new_line: &str) -> Result<()>;

    /// Place a zero-length selection at `offset`
    fn set_caret(&mut self, offset: usize) -> Result<()>;
}

/// In-memory text field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    buffer: TextBuffer,
    selection: Option<Selection>,
    focused: bool,
}

impl TextField {
    /// Focused field with no known selection
    pub fn new(text: &str) -> Self {
        Self::from_buffer(TextBuffer::new(text))
    }

    /// Focused field over raw UTF-16 units
    pub fn from_buffer(buffer: TextBuffer) -> Self {
        Self {
            buffer,
            selection: None,
            focused: true,
        }
    }

    /// Focused field with a caret at `offset`
    pub fn with_caret(text: &str, offset: usize) -> Self {
        Self::new(text).select(Selection::caret(offset))
    }

    /// A field that reports no focus, as when nothing editable is focused
    pub fn unfocused() -> Self {
        Self {
            buffer: TextBuffer::default(),
            selection: None,
            focused: false,
        }
    }

    pub fn select(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }
}

impl FocusedText for TextField {
    fn read_focused_text(&mut self) -> Option<FocusSnapshot> {
        if !self.focused {
            return None;
        }
        Some(FocusSnapshot::new(self.buffer.clone(), self.selection))
    }

    fn write_focused_text(&mut self, span: LineSpan, new_line: &str) -> Result<()> {
        if span.start > span.end || span.end > self.buffer.len() {
            return Err(ExpanderError::Other(format!(
                "span {}..{} outside text of length {}",
                span.start,
                span.end,
                self.buffer.len()
            )));
        }
        self.buffer = self.buffer.splice(span, new_line);
        Ok(())
    }

    fn set_caret(&mut self, offset: usize) -> Result<()> {
        self.selection = Some(Selection::caret(offset.min(self.buffer.len())));
        Ok(())
    }
}
