//! Writers and readers for the three document formats.
//!
//! - [`pd`] writes the native line-oriented patch text.
//! - [`json`] writes and reads a nested JSON tree.
//! - [`xml`] writes and reads one element per entity.

pub mod json;
pub mod pd;
pub mod xml;

use std::{fmt, io};

use pdpatch_core::{ModelError, model::Patch};

/// A single trait implemented by every document writer.
pub trait Exporter {
    /// Write the patch as a document.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the document cannot be produced.
    fn export(&self, patch: &Patch) -> Result<String, Error>;
}

/// A single trait implemented by every structured document reader.
pub trait Importer {
    /// Rebuild a patch from a document.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the document is not well formed or does
    /// not describe a valid patch.
    fn import(&self, text: &str) -> Result<Patch, Error>;
}

#[derive(Debug)]
pub enum Error {
    Json(serde_json::Error),
    Xml(quick_xml::Error),
    Io(io::Error),
    Model(ModelError),
    /// The document parsed but does not describe a patch.
    Malformed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "JSON error: {err}"),
            Self::Xml(err) => write!(f, "XML error: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Model(err) => write!(f, "{err}"),
            Self::Malformed(msg) => write!(f, "Malformed document: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Xml(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Model(err) => Some(err),
            Self::Malformed(_) => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ModelError> for Error {
    fn from(err: ModelError) -> Self {
        Self::Model(err)
    }
}
