//! Collector for accumulating diagnostics during a parse.

use log::warn;

use crate::error::{Diagnostic, ParseError};

/// Accumulates the diagnostics of one parse.
///
/// Warnings are logged as they are emitted, since they never reach the
/// caller of a successful parse.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        } else {
            let span = diagnostic.primary_span().map(|span| span.range());
            warn!(span:?; "{diagnostic}");
        }
        self.diagnostics.push(diagnostic);
    }

    /// Returns `true` once an error has been emitted.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Finish collection.
    ///
    /// Returns `Err(ParseError)` with every diagnostic if an error was
    /// emitted. Warnings are dropped in the success case.
    pub fn finish(self) -> Result<(), ParseError> {
        if self.has_errors() {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    #[test]
    fn test_collector_new_finish_ok() {
        let collector = DiagnosticCollector::new();
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_collector_warnings_only() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(Diagnostic::warning("unknown statement `#X foo`"));
        collector.emit(Diagnostic::warning("malformed `#X connect`"));

        assert!(!collector.has_errors());
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_collector_keeps_all_diagnostics_on_error() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(Diagnostic::warning("skipped"));
        collector.emit(
            Diagnostic::error("subpatch is never closed")
                .with_code(ErrorCode::E103)
                .with_label(Span::new(10..20), "opened here"),
        );

        assert!(collector.has_errors());
        let err = collector.finish().unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
        assert_eq!(err.diagnostics()[1].message(), "subpatch is never closed");
    }
}
