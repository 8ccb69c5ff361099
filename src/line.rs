//! Text snapshots and current-line location.
//!
//! Offsets are UTF-16 code units, the unit accessibility APIs report
//! selections in. A buffer and its selection always use the same unit.

use std::fmt;

pub const LINE_FEED: u16 = 10;
pub const CARRIAGE_RETURN: u16 = 13;

/// Immutable snapshot of a text field's contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    units: Vec<u16>,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            units: text.encode_utf16().collect(),
        }
    }

    pub fn from_units(units: Vec<u16>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &[u16] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Text covered by `span`, with the span clamped to the buffer
    pub fn slice(&self, span: LineSpan) -> String {
        let end = span.end.min(self.len());
        let start = span.start.min(end);
        String::from_utf16_lossy(&self.units[start..end])
    }

    /// Text covered by `span`, or `None` if it holds unpaired surrogates
    pub fn slice_exact(&self, span: LineSpan) -> Option<String> {
        let end = span.end.min(self.len());
        let start = span.start.min(end);
        String::from_utf16(&self.units[start..end]).ok()
    }

    /// A new buffer with `span` replaced by `replacement`
    pub fn splice(&self, span: LineSpan, replacement: &str) -> TextBuffer {
        let end = span.end.min(self.len());
        let start = span.start.min(end);

        let mut units = Vec::with_capacity(self.len() - (end - start) + replacement.len());
        units.extend_from_slice(&self.units[..start]);
        units.extend(replacement.encode_utf16());
        units.extend_from_slice(&self.units[end..]);
        TextBuffer { units }
    }

    /// Current line around `cursor`
    pub fn line_at(&self, cursor: usize) -> LineSpan {
        locate_line(&self.units, cursor)
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        TextBuffer::new(text)
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf16_lossy(&self.units))
    }
}

/// Caret or selected range: `[location, location + length)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub location: usize,
    pub length: usize,
}

impl Selection {
    pub fn new(location: usize, length: usize) -> Self {
        Self { location, length }
    }

    /// Zero-length selection
    pub fn caret(location: usize) -> Self {
        Self {
            location,
            length: 0,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.length == 0
    }
}

/// Half-open range `[start, end)` holding one line of a buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

pub fn is_line_terminator(unit: u16) -> bool {
    unit == LINE_FEED || unit == CARRIAGE_RETURN
}

/// Find the line surrounding `cursor`.
///
/// The cursor is clamped into `[0, buffer.len()]`. Neither scan consumes a
/// terminator, so a cursor sitting on `\n` ends the line there.
pub fn locate_line(buffer: &[u16], cursor: usize) -> LineSpan {
    let cursor = cursor.min(buffer.len());

    let mut start = cursor;
    while start > 0 && !is_line_terminator(buffer[start - 1]) {
        start -= 1;
    }

    let mut end = cursor;
    while end < buffer.len() && !is_line_terminator(buffer[end]) {
        end += 1;
    }

    LineSpan { start, end }
}

/// Length of `text` in UTF-16 code units
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}
