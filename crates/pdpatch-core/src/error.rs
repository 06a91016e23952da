//! Error types raised while constructing the document model.

use thiserror::Error;

/// Errors raised by the document model constructors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A patch or canvas name contains characters that are structural in the
    /// patch syntax.
    #[error("malformed name `{name}`: `{found}` is not allowed in patch or canvas names")]
    MalformedName { name: String, found: char },

    /// The factory was asked for a node type tag it does not know.
    #[error("unknown node type tag `{0}`")]
    UnknownTag(String),

    /// A canvas id does not address a canvas of this patch.
    #[error("canvas {0} does not exist")]
    MissingCanvas(usize),
}
