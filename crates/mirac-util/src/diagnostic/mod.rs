//! Diagnostic messages and the diagnostic manager.
//!
//! A [`Diagnostic`] is a batch of [`Message`]s. Each message carries a
//! severity, human-readable text, the source locations it is about, and
//! optionally one or more suggested [`Fix`]es (per-line replacement
//! diffs). The [`DiagnosticManager`] accumulates severity counters and
//! pretty-prints every message whose severity meets the configured
//! threshold.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use mirac_util::diagnostic::{Diagnostic, DiagnosticManager, Message};
//! use mirac_util::span::SourceMap;
//!
//! let map = Arc::new(SourceMap::new());
//! let manager = DiagnosticManager::new(map);
//! manager.report(Message::error("unexpected token").into());
//! assert_eq!(manager.error_count(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::span::{FileId, SourceLocation, SourceMap};

/// Diagnostic severity, most severe first.
///
/// The derived ordering (`Fatal < Error < … < Info`) is what threshold
/// comparison relies on: a message is rendered when
/// `severity <= threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Unrecoverable; compilation stops after reporting
    Fatal,
    /// Prevents evaluation but analysis continues
    Error,
    Warning,
    Hint,
    Info,
}

impl Severity {
    fn index(self) -> usize {
        match self {
            Severity::Fatal => 0,
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Hint => 3,
            Severity::Info => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "fatal"),
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Hint => write!(f, "hint"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single-line replacement inside a suggested fix.
#[derive(Clone, Debug)]
pub struct FixDiff {
    /// File the replacement applies to
    pub file: FileId,
    /// Line number (1-based)
    pub line: usize,
    /// Full replacement text for the line
    pub replacement: String,
}

/// A suggested fix: one or more line replacements.
#[derive(Clone, Debug, Default)]
pub struct Fix {
    diffs: Vec<FixDiff>,
}

impl Fix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diff(mut self, file: FileId, line: usize, replacement: impl Into<String>) -> Self {
        self.diffs.push(FixDiff {
            file,
            line,
            replacement: replacement.into(),
        });
        self
    }

    #[inline]
    pub fn diffs(&self) -> &[FixDiff] {
        &self.diffs
    }
}

/// One diagnostic message.
#[derive(Clone, Debug)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
    pub related: Vec<SourceLocation>,
    pub fixes: Vec<Fix>,
}

impl Message {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
            related: Vec::new(),
            fixes: Vec::new(),
        }
    }

    pub fn fatal(text: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    /// Attach a related source location. Invalid locations are accepted
    /// and skipped at rendering time.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.related.push(location);
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fixes.push(fix);
        self
    }
}

/// A batch of messages reported together.
#[derive(Clone, Debug, Default)]
pub struct Diagnostic {
    messages: Vec<Message>,
}

impl Diagnostic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

impl From<Message> for Diagnostic {
    fn from(message: Message) -> Self {
        Diagnostic {
            messages: vec![message],
        }
    }
}

/// Accumulates diagnostics, keeps per-severity counters, and renders
/// messages at or above the severity threshold to standard output.
///
/// The manager never terminates the process; callers inspect
/// [`fatal_count`](Self::fatal_count) / [`error_count`](Self::error_count)
/// and decide whether to keep going.
pub struct DiagnosticManager {
    sources: Arc<SourceMap>,
    threshold: Severity,
    counts: RefCell<[usize; 5]>,
    messages: RefCell<Vec<Message>>,
}

impl DiagnosticManager {
    /// A manager that renders every severity.
    pub fn new(sources: Arc<SourceMap>) -> Self {
        Self::with_threshold(sources, Severity::Info)
    }

    /// A manager that renders messages with `severity <= threshold`.
    pub fn with_threshold(sources: Arc<SourceMap>, threshold: Severity) -> Self {
        Self {
            sources,
            threshold,
            counts: RefCell::new([0; 5]),
            messages: RefCell::new(Vec::new()),
        }
    }

    /// Record a diagnostic, bumping counters and printing every message
    /// that meets the threshold.
    pub fn report(&self, diagnostic: Diagnostic) {
        for message in diagnostic.messages() {
            self.counts.borrow_mut()[message.severity.index()] += 1;

            if message.severity <= self.threshold {
                print!("{}", self.render(message));
            }

            self.messages.borrow_mut().push(message.clone());
        }
    }

    /// Render one message: `severity: text`, the related source lines
    /// (indentation stripped, zero-padded line numbers), then any
    /// suggested fixes as before/after diff lines.
    pub fn render(&self, message: &Message) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}: {}", message.severity, message.text);

        for location in &message.related {
            if !location.is_valid() {
                continue;
            }
            let Some(file) = self.sources.get(location.file) else {
                continue;
            };
            for line_no in location.start_line..=location.end_line {
                if let Some(line) = file.line(line_no as usize) {
                    let _ = writeln!(out, "{:04}| {}", line_no, line.trim_start());
                }
            }
        }

        if !message.fixes.is_empty() {
            let _ = writeln!(out, "probably fix:");
            for fix in &message.fixes {
                for diff in fix.diffs() {
                    let Some(file) = self.sources.get(diff.file) else {
                        continue;
                    };
                    if let Some(line) = file.line(diff.line) {
                        let _ = writeln!(out, "-{:03}| {}", diff.line, line.trim_start());
                    }
                }
                for diff in fix.diffs() {
                    let _ = writeln!(out, "+{:03}| {}", diff.line, diff.replacement.trim_start());
                }
            }
        }

        out.push('\n');
        out
    }

    #[inline]
    pub fn fatal_count(&self) -> usize {
        self.counts.borrow()[Severity::Fatal.index()]
    }

    #[inline]
    pub fn error_count(&self) -> usize {
        self.counts.borrow()[Severity::Error.index()]
    }

    #[inline]
    pub fn warning_count(&self) -> usize {
        self.counts.borrow()[Severity::Warning.index()]
    }

    #[inline]
    pub fn hint_count(&self) -> usize {
        self.counts.borrow()[Severity::Hint.index()]
    }

    #[inline]
    pub fn info_count(&self) -> usize {
        self.counts.borrow()[Severity::Info.index()]
    }

    /// True if anything that must stop evaluation has been reported.
    pub fn has_errors(&self) -> bool {
        self.fatal_count() > 0 || self.error_count() > 0
    }

    /// All messages reported so far, in order.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SourceMap;

    fn manager_with(source: &str) -> (DiagnosticManager, FileId) {
        let mut map = SourceMap::new();
        let file = map.add_file("test.mira", source);
        (
            // Fatal-only threshold keeps test output quiet
            DiagnosticManager::with_threshold(Arc::new(map), Severity::Fatal),
            file,
        )
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Fatal < Severity::Error);
        assert!(Severity::Error < Severity::Warning);
        assert!(Severity::Warning < Severity::Hint);
        assert!(Severity::Hint < Severity::Info);
    }

    #[test]
    fn test_counters() {
        let (manager, _) = manager_with("");
        manager.report(Message::error("one").into());
        manager.report(Message::error("two").into());
        manager.report(Message::warning("three").into());

        assert_eq!(manager.error_count(), 2);
        assert_eq!(manager.warning_count(), 1);
        assert_eq!(manager.fatal_count(), 0);
        assert!(manager.has_errors());
    }

    #[test]
    fn test_multi_message_diagnostic_counts_each() {
        let (manager, _) = manager_with("");
        let mut diagnostic = Diagnostic::new();
        diagnostic.push(Message::error("a"));
        diagnostic.push(Message::new(Severity::Hint, "b"));
        manager.report(diagnostic);

        assert_eq!(manager.error_count(), 1);
        assert_eq!(manager.hint_count(), 1);
        assert_eq!(manager.messages().len(), 2);
    }

    #[test]
    fn test_render_snippet_strips_indentation() {
        let (manager, file) = manager_with("    var int32 x = 1\nnext");
        let location = SourceLocation::new(file, 4, 19, 1, 1, 5, 19);
        let message = Message::error("expected semicolon").with_location(location);

        let rendered = manager.render(&message);
        assert!(rendered.starts_with("error: expected semicolon\n"));
        assert!(rendered.contains("0001| var int32 x = 1\n"));
    }

    #[test]
    fn test_render_fix_diff_lines() {
        let (manager, file) = manager_with("var int32 x = 1");
        let message = Message::error("expected semicolon")
            .with_fix(Fix::new().with_diff(file, 1, "var int32 x = 1;"));

        let rendered = manager.render(&message);
        assert!(rendered.contains("probably fix:\n"));
        assert!(rendered.contains("-001| var int32 x = 1\n"));
        assert!(rendered.contains("+001| var int32 x = 1;\n"));
    }

    #[test]
    fn test_invalid_location_is_skipped() {
        let (manager, _) = manager_with("line");
        let message = Message::error("boom").with_location(SourceLocation::INVALID);
        let rendered = manager.render(&message);
        assert_eq!(rendered, "error: boom\n\n");
    }
}
