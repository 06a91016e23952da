//! # pdpatch Parser
//!
//! Parser for the Pure Data patch text format. This crate provides the
//! pipeline from source text to the [`Patch`] document model.
//!
//! ## Usage
//!
//! ```
//! # use pdpatch_parser::{parse, error::ParseError};
//! fn main() -> Result<(), ParseError> {
//!     let source = "#N canvas 0 22 450 300 12;\r\n\
//!                   #X obj 10 10 loadbang;\r\n\
//!                   #X obj 10 30 print;\r\n\
//!                   #X connect 0 0 1 0;\r\n";
//!
//!     let patch = parse(source, "hello")?;
//!     assert_eq!(patch.root().nodes().len(), 2);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod statement;

mod lexer;
mod parser;
mod span;
mod template;
mod tokens;

pub use lexer::{lex, tokenize};
pub use span::Span;
pub use template::fill;

use log::{info, trace};

use pdpatch_core::model::Patch;

use error::ParseError;

/// Parse patch source text into a [`Patch`] named `name`.
///
/// The pipeline has two steps:
///
/// 1. **Lex** - Split the source into statements of raw fields
/// 2. **Parse** - Run the canvas-stack state machine over the statements
///
/// Recoverable problems are logged and the offending statement is skipped.
///
/// # Errors
///
/// Returns a [`ParseError`] when the name is malformed, the source has no
/// root canvas or the canvas nesting is unbalanced.
pub fn parse(source: &str, name: &str) -> Result<Patch, ParseError> {
    info!(name, bytes = source.len(); "Parsing patch");

    // Step 1: Lex
    let statements = lexer::lex(source);

    // Step 2: Parse
    let patch = parser::build_patch(&statements, name, source.len())?;

    trace!(patch:?; "Parsed patch");
    Ok(patch)
}
