//! Error codes for the patch diagnostics.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Template errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated statement.
    ///
    /// The source ends with a statement that has no closing `;`. The
    /// statement is still parsed.
    E001,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unknown statement.
    ///
    /// The statement head is not one the parser understands.
    E100,

    /// Malformed statement.
    ///
    /// The statement has the wrong number of arguments or an argument that
    /// should be numeric is not.
    E101,

    /// Restore without an open subpatch.
    ///
    /// A `#X restore` was found while only the root canvas was open.
    E102,

    /// Unbalanced canvas stack.
    ///
    /// The input ended while one or more subpatches were still open.
    E103,

    /// Missing root canvas.
    ///
    /// The input has no `#N canvas` statement to open the root canvas.
    E104,

    /// Malformed patch name.
    ///
    /// The patch name contains a character that is structural in the
    /// patch syntax.
    E105,

    /// Statement outside of a canvas.
    ///
    /// A statement that needs a canvas appears before the root canvas.
    E106,

    // =========================================================================
    // Template Errors (E2xx)
    // =========================================================================
    /// Undefined template.
    ///
    /// A scalar or array field refers to a template that was never declared.
    E200,

    /// Unknown field type.
    ///
    /// A `#N struct` field has a type other than `float`, `symbol`, `text`
    /// or `array`.
    E201,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            // Template errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unterminated statement",
            // Parser errors
            ErrorCode::E100 => "unknown statement",
            ErrorCode::E101 => "malformed statement",
            ErrorCode::E102 => "restore without open subpatch",
            ErrorCode::E103 => "unbalanced canvas stack",
            ErrorCode::E104 => "missing root canvas",
            ErrorCode::E105 => "malformed name",
            ErrorCode::E106 => "statement outside of a canvas",
            // Template errors
            ErrorCode::E200 => "undefined template",
            ErrorCode::E201 => "unknown field type",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E103.to_string(), "E103");
        assert_eq!(ErrorCode::E200.to_string(), "E200");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unterminated statement");
        assert_eq!(ErrorCode::E103.description(), "unbalanced canvas stack");
        assert_eq!(ErrorCode::E200.description(), "undefined template");
    }
}
