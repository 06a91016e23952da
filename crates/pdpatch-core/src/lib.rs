//! pdpatch Core Types and Definitions
//!
//! This crate provides the foundational types for reading and writing Pure
//! Data patches. It includes:
//!
//! - **Geometry**: Positions, sizes and rectangular areas ([`geometry`] module)
//! - **Atoms**: Escaping and numeric decoding of patch atoms ([`atom`] module)
//! - **Model**: The patch document model, an arena of canvases ([`model`] module)
//! - **Errors**: Construction errors of the model ([`ModelError`])

pub mod atom;
pub mod geometry;
pub mod model;

mod error;

pub use error::ModelError;
