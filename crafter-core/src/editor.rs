//! Collaborator interfaces the core logic talks to instead of a concrete UI.
//!
//! The submission controller and highlight renderer never touch presentation state
//! directly. They read and write text through [`TextBuffer`] and report progress
//! through [`NotificationSink`]. The terminal UI implements both; tests use
//! [`MemoryBuffer`] and [`RecordingSink`].

use std::time::Duration;

/// Visual treatment attached to an annotated range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationStyle {
    /// A line that differs from the base code.
    Changed,
}

/// A marked range inside a buffer, in (line, column) coordinates.
///
/// Columns count characters, not bytes. A zero-width annotation
/// (`start_col == end_col`) is legal and marks a blank line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Annotation {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub style: AnnotationStyle,
}

impl Annotation {
    /// An annotation spanning the full width of a single line.
    pub fn whole_line(line: usize, width: usize, style: AnnotationStyle) -> Self {
        Self {
            start_line: line,
            start_col: 0,
            end_line: line,
            end_col: width,
            style,
        }
    }

    /// `true` if this annotation touches `line`.
    pub fn covers_line(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

/// A text surface with optional range annotations.
pub trait TextBuffer {
    fn content(&self) -> String;
    fn set_content(&mut self, text: &str);
    /// Currently selected text, or the empty string when nothing is selected.
    fn selection(&self) -> String;
    fn clear_annotations(&mut self);
    fn add_annotation(&mut self, annotation: Annotation);
    fn annotations(&self) -> &[Annotation];
}

/// Severity of a status notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    /// How long a notification of this severity stays on screen.
    pub fn default_duration(self) -> Duration {
        match self {
            Severity::Info | Severity::Success => Duration::from_secs(3),
            Severity::Error => Duration::from_secs(5),
        }
    }
}

/// A short, auto-dismissing status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            duration: severity.default_duration(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }
}

/// Receives status notifications.
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

/// Sink that keeps every notification it receives. Handy for headless runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub received: Vec<Notification>,
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, notification: Notification) {
        self.received.push(notification);
    }
}

/// An in-memory [`TextBuffer`].
///
/// The selection is a half-open character range over the whole content; it is
/// clamped to the content on read so a stale selection never panics.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    text: String,
    selection: Option<(usize, usize)>,
    annotations: Vec<Annotation>,
}

impl MemoryBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Selects characters `start..end` (order-insensitive).
    pub fn select(&mut self, start: usize, end: usize) {
        self.selection = Some((start.min(end), start.max(end)));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection_range(&self) -> Option<(usize, usize)> {
        self.selection
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn push_char(&mut self, ch: char) {
        self.text.push(ch);
    }

    pub fn pop_char(&mut self) -> Option<char> {
        self.text.pop()
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

impl TextBuffer for MemoryBuffer {
    fn content(&self) -> String {
        self.text.clone()
    }

    fn set_content(&mut self, text: &str) {
        self.text = text.to_owned();
        self.selection = None;
    }

    fn selection(&self) -> String {
        match self.selection {
            Some((start, end)) => self.text.chars().skip(start).take(end - start).collect(),
            None => String::new(),
        }
    }

    fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_is_char_based_and_clamped() {
        let mut buf = MemoryBuffer::new("héllo");
        buf.select(3, 1);
        assert_eq!(buf.selection(), "él");
        buf.select(2, 99);
        assert_eq!(buf.selection(), "llo");
    }

    #[test]
    fn set_content_drops_selection() {
        let mut buf = MemoryBuffer::new("abc");
        buf.select(0, 2);
        buf.set_content("xyz");
        assert_eq!(buf.selection(), "");
    }

    #[test]
    fn error_notifications_linger_longer() {
        let err = Notification::error("boom");
        let ok = Notification::success("ok");
        assert!(err.duration > ok.duration);
    }
}
