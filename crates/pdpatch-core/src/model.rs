//! The patch document model.
//!
//! A [`Patch`] owns every entity of one translation unit. Canvases live in a
//! flat arena inside the patch and are addressed by [`CanvasId`]; a subpatch
//! is a node whose kind is [`NodeKind::Subpatch`] pointing at its canvas,
//! and every canvas records its parent as an id. There are no back
//! references, so the whole tree is plain owned data.
//!
//! # Overview
//!
//! - [`Patch`] - root aggregate: templates, dependencies and the canvas arena.
//! - [`Canvas`] - node container for one window, with comments and connections.
//! - [`Node`] - a placed entity; its variant is a [`NodeKind`].
//! - [`Connection`] - outlet to inlet edge between two nodes of one canvas.
//! - [`StructTemplate`] / [`ScalarInstance`] - typed records and their data.
//!
//! # Example
//!
//! ```
//! # use pdpatch_core::model::{Connection, NodeKind, Object, Patch};
//! # use pdpatch_core::geometry::Point;
//! let mut patch = Patch::new("synth").unwrap();
//! let root = patch.root_mut();
//! let osc = root.add_node(NodeKind::Object(Object::new("osc~", ["440"])), None);
//! let dac = root.add_node(NodeKind::Object(Object::new("dac~", Vec::<String>::new())), None);
//! root.connect(Connection::new(osc, 0, dac, 0));
//!
//! assert_eq!(patch.root().nodes().len(), 2);
//! assert_eq!(patch.root().connections().len(), 1);
//! ```

mod canvas;
mod comment;
mod connection;
mod data;
mod dependencies;
mod graph;
mod message;
mod node;
mod patch;
mod template;
mod widget;

pub use canvas::{Canvas, Coords};
pub use comment::Comment;
pub use connection::Connection;
pub use data::{DataBlock, DataBlockKind, Payload};
pub use dependencies::Dependencies;
pub use graph::{GopArray, Graph, GraphArray};
pub use message::{Message, MessageTarget};
pub use node::{Node, NodeKind, Object};
pub use patch::{CanvasId, Patch};
pub use template::{
    ArrayBinding, Binding, FieldKind, ScalarData, ScalarInstance, StructField, StructTemplate,
};
pub use widget::{Widget, WidgetKind};
