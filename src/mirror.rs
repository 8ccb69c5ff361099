//! Focused-field access built from observed keystrokes.
//!
//! Global key events do not reveal the focused field's contents, so the
//! mirror keeps its own copy of what was typed since the caret last moved
//! unpredictably. Edits are applied by synthesising Backspace presses and
//! typing the replacement. Tab and anything seen right after an injection
//! reset the mirror, since the caret may no longer follow the recorded text.

use crate::error::{ExpanderError, Result};
use crate::focus::{FocusSnapshot, FocusedText};
use crate::keyboard::{create_keyboard_controller, press_key, send_backspace, type_text, Delimiter};
use crate::line::{utf16_len, LineSpan, Selection, TextBuffer};
use enigo::Enigo;
use log::{debug, trace};
use std::thread;
use std::time::{Duration, Instant};
use unicode_segmentation::UnicodeSegmentation;

/// Characters kept in the mirror; older text is dropped from the front
pub const MIRROR_CAPACITY: usize = 512;
/// Key events are ignored for this long after an injection
pub const ECHO_WINDOW: Duration = Duration::from_millis(250);

/// Destination for synthetic keystrokes
pub trait KeystrokeSink {
    fn backspace(&mut self, count: usize) -> Result<()>;
    fn type_text(&mut self, text: &str) -> Result<()>;
    fn press(&mut self, delimiter: Delimiter) -> Result<()>;
}

/// Sends keystrokes through enigo, creating the controller on first use
#[derive(Default)]
pub struct EnigoSink {
    keyboard: Option<Enigo>,
}

impl EnigoSink {
    fn keyboard(&mut self) -> Result<&mut Enigo> {
        if self.keyboard.is_none() {
            self.keyboard = Some(create_keyboard_controller()?);
        }
        self.keyboard
            .as_mut()
            .ok_or_else(|| ExpanderError::Enigo("keyboard controller unavailable".to_string()))
    }
}

impl KeystrokeSink for EnigoSink {
    fn backspace(&mut self, count: usize) -> Result<()> {
        send_backspace(self.keyboard()?, count)
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        // Small delay so the deletions land before the replacement
        thread::sleep(Duration::from_millis(10));
        type_text(self.keyboard()?, text)
    }

    fn press(&mut self, delimiter: Delimiter) -> Result<()> {
        press_key(self.keyboard()?, delimiter.enigo_key())
    }
}

pub struct KeystrokeMirror<S: KeystrokeSink = EnigoSink> {
    text: String,
    pending: Option<Delimiter>,
    suppress_until: Option<Instant>,
    sink: S,
}

impl KeystrokeMirror<EnigoSink> {
    pub fn new() -> Self {
        Self::with_sink(EnigoSink::default())
    }
}

impl Default for KeystrokeMirror<EnigoSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: KeystrokeSink> KeystrokeMirror<S> {
    pub fn with_sink(sink: S) -> Self {
        Self {
            text: String::new(),
            pending: None,
            suppress_until: None,
            sink,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// True while our own injected keystrokes may still be arriving
    pub fn is_suppressed(&self, now: Instant) -> bool {
        self.suppress_until.is_some_and(|until| now < until)
    }

    pub fn observe_char(&mut self, c: char) {
        self.text.push(c);

        let excess = self.text.chars().count().saturating_sub(MIRROR_CAPACITY);
        if excess > 0 {
            let cut = self
                .text
                .char_indices()
                .nth(excess)
                .map(|(i, _)| i)
                .unwrap_or(self.text.len());
            self.text.drain(..cut);
        }
    }

    pub fn observe_backspace(&mut self) {
        self.text.pop();
    }

    /// Forget everything typed so far
    pub fn reset(&mut self) {
        if !self.text.is_empty() {
            trace!("Keystroke mirror reset");
        }
        self.text.clear();
        self.pending = None;
    }

    /// A delimiter was pressed; the next read sees the text typed before it
    pub fn begin_delimiter(&mut self, delimiter: Delimiter) {
        self.pending = Some(delimiter);
    }

    /// Record the delimiter unless an expansion already re-typed it
    pub fn finish_delimiter(&mut self) {
        if let Some(delimiter) = self.pending.take() {
            self.record_delimiter(delimiter);
        }
    }

    fn record_delimiter(&mut self, delimiter: Delimiter) {
        if delimiter.moves_focus() {
            // The next keystrokes may land in another field
            self.reset();
        } else {
            self.observe_char(delimiter.as_char());
        }
    }
}

impl<S: KeystrokeSink> FocusedText for KeystrokeMirror<S> {
    fn read_focused_text(&mut self) -> Option<FocusSnapshot> {
        if self.text.is_empty() {
            return None;
        }
        let buffer = TextBuffer::new(&self.text);
        let caret = Selection::caret(buffer.len());
        Some(FocusSnapshot::new(buffer, Some(caret)))
    }

    fn write_focused_text(&mut self, span: LineSpan, new_line: &str) -> Result<()> {
        let buffer = TextBuffer::new(&self.text);
        if span.end != buffer.len() || span.start > span.end {
            return Err(ExpanderError::Other(
                "only the line ending at the caret can be rewritten".to_string(),
            ));
        }

        let old_line = buffer.slice(span);
        let typed_delimiter = usize::from(self.pending.is_some());
        let deletions = old_line.graphemes(true).count() + typed_delimiter;

        self.suppress_until = Some(Instant::now() + ECHO_WINDOW);
        self.sink.backspace(deletions)?;
        self.sink.type_text(new_line)?;
        if let Some(delimiter) = self.pending.take() {
            self.sink.press(delimiter)?;
            self.text = buffer.splice(span, new_line).to_string();
            self.record_delimiter(delimiter);
        } else {
            self.text = buffer.splice(span, new_line).to_string();
        }
        // Restart the window now that the last keystroke has been sent
        self.suppress_until = Some(Instant::now() + ECHO_WINDOW);

        debug!(
            "Replaced {} typed characters with {} code units",
            deletions,
            utf16_len(new_line)
        );
        Ok(())
    }

    fn set_caret(&mut self, offset: usize) -> Result<()> {
        // Typing the replacement already left the caret at the end of the line
        trace!("Caret expected at offset {}", offset);
        Ok(())
    }
}
