//! JSON documents.
//!
//! Canvases are listed in nesting order, the root first. A subpatch node
//! refers to its canvas by index into that list, so reading a document
//! never recurses deeper than one canvas however far subpatches nest.
//! Every node object holds a `pdpy` member naming its variant next to the
//! fields of that variant.
//!
//! ```json
//! {
//!   "name": "synth",
//!   "encoding": "utf-8",
//!   "canvases": [
//!     {
//!       "name": "",
//!       "nodes": [
//!         { "id": 0, "position": { "x": 10, "y": 10 }, "pdpy": "Object",
//!           "class": "osc~", "args": ["440"] },
//!         { "id": 1, "pdpy": "Subpatch", "canvas": 1 }
//!       ],
//!       "connections": []
//!     },
//!     { "name": "voice", "nodes": [], "connections": [] }
//!   ]
//! }
//! ```

use std::{collections::HashMap, mem};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use pdpatch_core::{
    geometry::{Point, Size},
    model::{
        Canvas, CanvasId, Comment, Connection, Coords, DataBlock, Dependencies, GopArray, Graph,
        Message, Node, NodeKind, Object, Patch, Payload, ScalarInstance, StructTemplate, Widget,
    },
};

use super::{Error, Exporter, Importer};

/// Writes patches as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter {
    pretty: bool,
}

impl JsonExporter {
    /// An exporter that indents its output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Exporter for JsonExporter {
    fn export(&self, patch: &Patch) -> Result<String, Error> {
        let document = PatchDocument::from_patch(patch)?;
        let text = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        debug!(bytes = text.len(); "JSON document written");
        Ok(text)
    }
}

/// Reads patches back from JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonImporter;

impl Importer for JsonImporter {
    fn import(&self, text: &str) -> Result<Patch, Error> {
        let document: PatchDocument = serde_json::from_str(text)?;
        let patch = document.into_patch()?;
        debug!(canvases = patch.canvas_count(); "JSON document read");
        Ok(patch)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PatchDocument {
    name: String,
    #[serde(default = "default_encoding")]
    encoding: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    templates: Vec<StructTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dependencies: Option<Dependencies>,
    /// Root first, then every subpatch canvas in nesting order.
    canvases: Vec<CanvasDocument>,
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct CanvasDocument {
    name: String,
    #[serde(default)]
    screen: Point,
    #[serde(default)]
    size: Size,
    /// Only the root canvas stores a font; nested canvases inherit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font: Option<f32>,
    #[serde(default = "visible")]
    visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coords: Option<Coords>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    title: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    border: Option<u32>,
    #[serde(default)]
    nodes: Vec<NodeDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    comments: Vec<Comment>,
    #[serde(default)]
    connections: Vec<Connection>,
}

fn visible() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeDocument {
    id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    border: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    payload: Vec<Payload>,
    #[serde(flatten)]
    kind: KindDocument,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "pdpy")]
enum KindDocument {
    Object(Object),
    Message(Message),
    Widget(Widget),
    DataBlock(DataBlock),
    Scalar(ScalarInstance),
    Graph(Graph),
    GopArray(GopArray),
    /// Index of the subpatch canvas in the document canvas list.
    Subpatch { canvas: usize },
}

impl PatchDocument {
    fn from_patch(patch: &Patch) -> Result<Self, Error> {
        let order = patch.preorder();
        let index: HashMap<CanvasId, usize> = order
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();
        let canvases = order
            .iter()
            .map(|id| {
                let canvas = patch
                    .canvas(*id)
                    .ok_or_else(|| Error::Malformed(format!("{id} is not part of the patch")))?;
                CanvasDocument::from_canvas(canvas, &index)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: patch.name().to_string(),
            encoding: patch.encoding().to_string(),
            templates: patch.templates().to_vec(),
            dependencies: patch.dependencies().cloned(),
            canvases,
        })
    }

    /// Rebuild the patch, one canvas at a time in list order. A subpatch
    /// node opens the canvas it refers to, which must come later in the
    /// list and belong to no other subpatch.
    fn into_patch(self) -> Result<Patch, Error> {
        let mut canvases = self.canvases;
        let root = canvases
            .first()
            .ok_or_else(|| Error::Malformed("the document has no root canvas".to_string()))?;
        let font = root.font.unwrap_or(Patch::DEFAULT_FONT);
        let mut canvas = Canvas::root(root.name.clone(), root.screen, root.size, font);
        root.apply_header(&mut canvas);

        let mut patch = Patch::with_root(self.name, canvas)?;
        patch.set_encoding(self.encoding);
        for template in self.templates {
            patch.add_template(template);
        }
        if let Some(dependencies) = self.dependencies {
            patch.merge_dependencies(dependencies);
        }

        let mut slots: Vec<Option<CanvasId>> = vec![None; canvases.len()];
        slots[0] = Some(CanvasId::ROOT);
        for index in 0..canvases.len() {
            let parent = slots[index].ok_or_else(|| {
                Error::Malformed(format!("canvas {index} belongs to no subpatch"))
            })?;

            for node in mem::take(&mut canvases[index].nodes) {
                let NodeDocument {
                    id,
                    position,
                    border,
                    payload,
                    kind,
                } = node;
                let id = match kind {
                    KindDocument::Subpatch { canvas: nested } => {
                        let header = canvases
                            .get(nested)
                            .filter(|_| nested > index && slots[nested].is_none())
                            .ok_or_else(|| {
                                Error::Malformed(format!(
                                    "subpatch {id} cannot open canvas {nested}"
                                ))
                            })?;
                        let mut canvas = Canvas::subpatch_unchecked(
                            header.name.clone(),
                            header.screen,
                            header.size,
                            header.visible,
                        );
                        header.apply_header(&mut canvas);
                        let (child, id) =
                            patch.add_subpatch_with_id(parent, id, canvas, position)?;
                        slots[nested] = Some(child);
                        id
                    }
                    other => {
                        let kind = other
                            .into_kind()
                            .ok_or_else(|| Error::Malformed("unexpected subpatch".to_string()))?;
                        canvas_mut(&mut patch, parent)?.add_node_with_id(id, kind, position)
                    }
                };
                if let Some(node) = canvas_mut(&mut patch, parent)?.node_mut(id) {
                    decorate(node, border, payload);
                }
            }

            // Comments and connections once every node of the canvas exists
            let canvas = canvas_mut(&mut patch, parent)?;
            for comment in mem::take(&mut canvases[index].comments) {
                canvas.add_comment(comment);
            }
            for connection in mem::take(&mut canvases[index].connections) {
                canvas.connect(connection);
            }
        }

        trace!(patch:?; "Patch rebuilt from JSON");
        Ok(patch)
    }
}

fn canvas_mut(patch: &mut Patch, id: CanvasId) -> Result<&mut Canvas, Error> {
    patch
        .canvas_mut(id)
        .ok_or_else(|| Error::Malformed(format!("{id} is not part of the patch")))
}

fn decorate(node: &mut Node, border: Option<u32>, payload: Vec<Payload>) {
    if let Some(border) = border {
        node.set_border(border);
    }
    for payload in payload {
        node.push_payload(payload);
    }
}

impl CanvasDocument {
    fn from_canvas(canvas: &Canvas, index: &HashMap<CanvasId, usize>) -> Result<Self, Error> {
        let nodes = canvas
            .nodes()
            .iter()
            .map(|node| NodeDocument::from_node(node, index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: canvas.name().to_string(),
            screen: canvas.screen(),
            size: canvas.size(),
            font: canvas.is_root().then(|| canvas.font()),
            visible: canvas.is_visible(),
            coords: canvas.coords(),
            title: canvas.title().to_vec(),
            border: canvas.border(),
            nodes,
            comments: canvas.comments().to_vec(),
            connections: canvas.connections().to_vec(),
        })
    }

    fn apply_header(&self, canvas: &mut Canvas) {
        if let Some(coords) = self.coords {
            canvas.set_coords(coords);
        }
        canvas.set_title(self.title.clone());
        if let Some(border) = self.border {
            canvas.set_border(border);
        }
    }
}

impl NodeDocument {
    fn from_node(node: &Node, index: &HashMap<CanvasId, usize>) -> Result<Self, Error> {
        let kind = match node.kind() {
            NodeKind::Object(object) => KindDocument::Object(object.clone()),
            NodeKind::Message(message) => KindDocument::Message(message.clone()),
            NodeKind::Widget(widget) => KindDocument::Widget(widget.clone()),
            NodeKind::DataBlock(block) => KindDocument::DataBlock(block.clone()),
            NodeKind::Scalar(scalar) => KindDocument::Scalar(scalar.clone()),
            NodeKind::Graph(graph) => KindDocument::Graph(graph.clone()),
            NodeKind::GopArray(array) => KindDocument::GopArray(array.clone()),
            NodeKind::Subpatch(id) => {
                let canvas = index
                    .get(id)
                    .copied()
                    .ok_or_else(|| Error::Malformed(format!("{id} is not part of the patch")))?;
                KindDocument::Subpatch { canvas }
            }
        };
        Ok(Self {
            id: node.id(),
            position: node.position(),
            border: node.border(),
            payload: node.data().to_vec(),
            kind,
        })
    }
}

impl KindDocument {
    /// The model variant, `None` for a subpatch: its canvas needs a slot in
    /// the arena first.
    fn into_kind(self) -> Option<NodeKind> {
        let kind = match self {
            KindDocument::Object(object) => NodeKind::Object(object),
            KindDocument::Message(message) => NodeKind::Message(message),
            KindDocument::Widget(widget) => NodeKind::Widget(widget),
            KindDocument::DataBlock(block) => NodeKind::DataBlock(block),
            KindDocument::Scalar(scalar) => NodeKind::Scalar(scalar),
            KindDocument::Graph(graph) => NodeKind::Graph(graph),
            KindDocument::GopArray(array) => NodeKind::GopArray(array),
            KindDocument::Subpatch { .. } => return None,
        };
        Some(kind)
    }
}
