//! Diagnostics — advisory errors and warnings on a build file.
//!
//! Diagnostics are attached only to the top-level resolution context. Imported
//! files are walked for symbols, never diagnosed.

use std::sync::Arc;

use crate::base::{LineCol, LineIndex, TextRange};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Span in the top-level document.
    pub range: TextRange,
    pub severity: Severity,
    /// Error/warning code (e.g., "B0001").
    pub code: Option<&'static str>,
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn error(range: TextRange, message: impl Into<Arc<str>>) -> Self {
        Self {
            range,
            severity: Severity::Error,
            code: None,
            message: message.into(),
        }
    }

    pub fn warning(range: TextRange, message: impl Into<Arc<str>>) -> Self {
        Self {
            range,
            severity: Severity::Warning,
            code: None,
            message: message.into(),
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Start and end positions for editor hosts.
    pub fn line_cols(&self, index: &LineIndex) -> (LineCol, LineCol) {
        index.line_cols(self.range)
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
pub mod codes {
    /// Import resolved to no files.
    pub const UNRESOLVED_IMPORT: &str = "B0001";
    /// SDK could not be resolved.
    pub const UNRESOLVED_SDK: &str = "B0002";
    /// Import closure contains a cycle.
    pub const IMPORT_CYCLE: &str = "B0003";
    /// Element not valid in this position.
    pub const UNKNOWN_ELEMENT: &str = "B0004";
    /// Attribute not valid on this element.
    pub const UNKNOWN_ATTRIBUTE: &str = "B0005";
    /// Required attribute missing.
    pub const MISSING_ATTRIBUTE: &str = "B0006";
    /// Required value empty.
    pub const EMPTY_VALUE: &str = "B0007";
    /// Malformed expression.
    pub const EXPRESSION_SYNTAX: &str = "B0008";
    /// Value does not match its kind.
    pub const INVALID_VALUE: &str = "B0009";
    /// Element may appear only once, or attributes conflict.
    pub const DUPLICATE_ELEMENT: &str = "B0010";
    /// Expression in a literal-only value.
    pub const EXPRESSION_NOT_ALLOWED: &str = "B0011";

    /// Function or class not in the allow-list.
    pub const UNKNOWN_FUNCTION: &str = "W0001";
    /// Task invoked but never declared.
    pub const UNDEFINED_TASK: &str = "W0002";
    /// Value not in the kind's closed set.
    pub const UNKNOWN_VALUE: &str = "W0003";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during validation.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, range: TextRange, code: &'static str, message: impl Into<Arc<str>>) {
        self.add(Diagnostic::error(range, message).with_code(code));
    }

    pub fn warning(&mut self, range: TextRange, code: &'static str, message: impl Into<Arc<str>>) {
        self.add(Diagnostic::warning(range, message).with_code(code));
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::TextSize;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(TextSize::from(start), TextSize::from(end))
    }

    #[test]
    fn test_diagnostic_with_code() {
        let diag = Diagnostic::error(range(0, 4), "bad").with_code(codes::UNRESOLVED_IMPORT);
        assert_eq!(diag.code, Some("B0001"));
        assert_eq!(diag.severity, Severity::Error);
    }

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new();
        collector.error(range(0, 1), codes::UNKNOWN_ELEMENT, "error 1");
        collector.error(range(1, 2), codes::UNKNOWN_ELEMENT, "error 2");
        collector.warning(range(2, 3), codes::UNDEFINED_TASK, "warning 1");

        assert_eq!(collector.error_count(), 2);
        assert_eq!(collector.warning_count(), 1);
        assert!(collector.has_errors());
        assert_eq!(collector.take().len(), 3);
        assert!(collector.diagnostics().is_empty());
    }

    #[test]
    fn test_severity_to_lsp() {
        assert_eq!(Severity::Error.to_lsp(), 1);
        assert_eq!(Severity::Warning.to_lsp(), 2);
        assert_eq!(Severity::Info.to_lsp(), 3);
        assert_eq!(Severity::Hint.to_lsp(), 4);
    }

    #[test]
    fn test_line_cols() {
        let index = LineIndex::new("<Project>\n  <Foo/>\n</Project>");
        let diag = Diagnostic::warning(range(12, 18), "unknown");
        let (start, end) = diag.line_cols(&index);
        assert_eq!((start.line, start.col), (1, 2));
        assert_eq!((end.line, end.col), (1, 8));
    }
}
