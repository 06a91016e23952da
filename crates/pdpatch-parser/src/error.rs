//! Error and diagnostic system for the patch parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Labeled spans pointing into the patch source
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! Recoverable problems (unknown statements, malformed arguments, missing
//! templates) are reported as warnings: they are logged and the statement is
//! skipped. Errors abort the parse and are returned as a [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use pdpatch_parser::error::{Diagnostic, ErrorCode};
//! # use pdpatch_parser::Span;
//!
//! let diag = Diagnostic::error("`restore` without an open subpatch")
//!     .with_code(ErrorCode::E102)
//!     .with_label(Span::new(40..58), "nothing to close here")
//!     .with_help("remove the statement or add the matching `#N canvas`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
