//! Error types for pdpatch operations.
//!
//! This module provides the main error type [`PdPatchError`] which wraps
//! the error conditions that can occur while reading, arranging and
//! writing patches.

use std::io;

use thiserror::Error;

use pdpatch_core::ModelError;
use pdpatch_parser::error::ParseError;

/// The main error type for pdpatch operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the structured
/// diagnostics so that callers can render them with source snippets.
#[derive(Debug, Error)]
pub enum PdPatchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Invalid document: {0}")]
    Document(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl From<crate::export::Error> for PdPatchError {
    fn from(error: crate::export::Error) -> Self {
        use crate::export::Error;

        match error {
            Error::Json(err) => Self::Json(err),
            Error::Model(err) => Self::Model(err),
            Error::Xml(err) => Self::Xml(err.to_string()),
            Error::Io(err) => Self::Io(err),
            Error::Malformed(message) => Self::Document(message),
        }
    }
}

impl PdPatchError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
