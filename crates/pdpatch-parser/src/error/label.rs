//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// A message attached to a span of the patch source.
///
/// A primary label marks the statement at fault; secondary labels point at
/// related statements, such as the `#N canvas` a missing `restore` belongs
/// to:
///
/// ```text
/// error[E103]: subpatch `inner` is never closed
///   --> synth.pd:3:1
///    |
///  3 | #N canvas 0 22 450 300 inner 0;
///    | ------------------------------- opened here
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_kinds() {
        let primary = Label::primary(Span::new(10..20), "unexpected restore");
        assert_eq!(primary.span().start(), 10);
        assert_eq!(primary.message(), "unexpected restore");
        assert!(primary.is_primary());

        let secondary = Label::secondary(Span::new(0..8), "opened here");
        assert!(secondary.is_secondary());
        assert!(!secondary.is_primary());
    }
}
