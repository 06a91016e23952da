//! Automatic placement of nodes.
//!
//! The [`Arranger`] walks the connection graph of every canvas of a patch
//! and gives a position to each node that has none.

mod arranger;

pub use arranger::Arranger;
