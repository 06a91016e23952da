//! Connections between nodes of one canvas.

use serde::{Deserialize, Serialize};

/// A directed edge from an outlet of one node to an inlet of another.
///
/// Endpoints are stable node ids, not output positions. The serializer maps
/// them to creation-order indices when the canvas is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    source: usize,
    outlet: u32,
    sink: usize,
    inlet: u32,
}

impl Connection {
    /// Create a connection from `source:outlet` to `sink:inlet`.
    pub fn new(source: usize, outlet: u32, sink: usize, inlet: u32) -> Self {
        Self {
            source,
            outlet,
            sink,
            inlet,
        }
    }

    /// Stable id of the source node.
    pub fn source(&self) -> usize {
        self.source
    }

    /// Outlet port on the source node.
    pub fn outlet(&self) -> u32 {
        self.outlet
    }

    /// Stable id of the sink node.
    pub fn sink(&self) -> usize {
        self.sink
    }

    /// Inlet port on the sink node.
    pub fn inlet(&self) -> u32 {
        self.inlet
    }
}
