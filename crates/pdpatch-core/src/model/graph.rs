//! Array containers: the legacy `graph` statement and graph-on-parent
//! arrays.

use serde::{Deserialize, Serialize};

use crate::geometry::Area;

use super::Payload;

/// One array declared inside a legacy graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphArray {
    name: String,
    length: usize,
    element: String,
    #[serde(default)]
    data: Vec<Payload>,
}

impl GraphArray {
    pub fn new(name: impl Into<String>, length: usize, element: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length,
            element: element.into(),
            data: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// The element type, usually `float`.
    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn data(&self) -> &[Payload] {
        &self.data
    }

    pub fn push_payload(&mut self, payload: Payload) {
        self.data.push(payload);
    }
}

/// The legacy array container (`#X graph ... #X pop`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    name: String,
    range: Area,
    area: Area,
    #[serde(default)]
    arrays: Vec<GraphArray>,
}

impl Graph {
    /// Create a graph from its value range and its on-screen area.
    pub fn new(name: impl Into<String>, range: Area, area: Area) -> Self {
        Self {
            name: name.into(),
            range,
            area,
            arrays: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value range (`x1 y1 x2 y2`).
    pub fn range(&self) -> Area {
        self.range
    }

    /// Screen area (`x1 y1 x2 y2`).
    pub fn area(&self) -> Area {
        self.area
    }

    pub fn arrays(&self) -> &[GraphArray] {
        &self.arrays
    }

    pub fn add_array(&mut self, array: GraphArray) {
        self.arrays.push(array);
    }

    pub fn last_array_mut(&mut self) -> Option<&mut GraphArray> {
        self.arrays.last_mut()
    }
}

/// A graph-on-parent array (`#X array name length type flags`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GopArray {
    name: String,
    length: usize,
    element: String,
    flags: u32,
}

impl GopArray {
    pub fn new(
        name: impl Into<String>,
        length: usize,
        element: impl Into<String>,
        flags: u32,
    ) -> Self {
        Self {
            name: name.into(),
            length,
            element: element.into(),
            flags,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    /// Save-contents and plot-style bits.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Returns `true` when the array contents are saved with the patch.
    pub fn saves_contents(&self) -> bool {
        self.flags & 1 == 1
    }
}
