//! Placed nodes and their variants.

use serde::{Deserialize, Serialize};

use crate::{
    ModelError,
    geometry::{Point, Size},
};

use super::{
    CanvasId, DataBlock, GopArray, Graph, Message, Payload, ScalarInstance, Widget,
};

/// A generic object box: a class name followed by its arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Object {
    class: String,
    #[serde(default)]
    args: Vec<String>,
}

impl Object {
    pub fn new<I, S>(class: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class: class.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The class name, empty for an empty object box.
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// The closed set of node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object(Object),
    Message(Message),
    Widget(Widget),
    DataBlock(DataBlock),
    Scalar(ScalarInstance),
    Graph(Graph),
    GopArray(GopArray),
    /// A nested canvas stored in the patch arena.
    Subpatch(CanvasId),
}

impl NodeKind {
    /// Type tags understood by [`NodeKind::empty`].
    pub const TAGS: [&'static str; 7] = [
        "Object",
        "Message",
        "Widget",
        "DataBlock",
        "Scalar",
        "Graph",
        "GopArray",
    ];

    /// The type tag of this variant.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Object(_) => "Object",
            NodeKind::Message(_) => "Message",
            NodeKind::Widget(_) => "Widget",
            NodeKind::DataBlock(_) => "DataBlock",
            NodeKind::Scalar(_) => "Scalar",
            NodeKind::Graph(_) => "Graph",
            NodeKind::GopArray(_) => "GopArray",
            NodeKind::Subpatch(_) => "Subpatch",
        }
    }

    /// Produce an empty instance of the variant named by `tag`.
    ///
    /// Subpatches are not produced here: they need a slot in the canvas arena
    /// and are created with [`Patch::add_subpatch`](super::Patch::add_subpatch).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownTag`] for any other tag.
    pub fn empty(tag: &str) -> Result<Self, ModelError> {
        use crate::geometry::Area;

        use super::DataBlockKind;

        let kind = match tag {
            "Object" => NodeKind::Object(Object::default()),
            "Message" => NodeKind::Message(Message::default()),
            "Widget" => NodeKind::Widget(Widget::empty()),
            "DataBlock" => NodeKind::DataBlock(DataBlock::new(DataBlockKind::Text, Vec::new())),
            "Scalar" => NodeKind::Scalar(ScalarInstance::new("", None)),
            "Graph" => NodeKind::Graph(Graph::new("", Area::default(), Area::default())),
            "GopArray" => NodeKind::GopArray(GopArray::new("", 0, "float", 0)),
            _ => return Err(ModelError::UnknownTag(tag.to_string())),
        };
        Ok(kind)
    }

    /// Returns `false` for nodes whose statement carries no position:
    /// scalars keep their coordinates in their fields, legacy graphs in
    /// their area and arrays live inside their canvas.
    pub fn has_position(&self) -> bool {
        !matches!(
            self,
            NodeKind::Scalar(_) | NodeKind::Graph(_) | NodeKind::GopArray(_)
        )
    }

    /// The text shown in the box, used to estimate its width.
    fn label(&self) -> String {
        match self {
            NodeKind::Object(object) => join_label(object.class(), object.args()),
            NodeKind::Message(message) => message.to_atoms().join(" "),
            NodeKind::Widget(widget) => widget.class().to_string(),
            NodeKind::DataBlock(block) => join_label(block.kind().as_str(), block.args()),
            NodeKind::Scalar(scalar) => scalar.template().to_string(),
            NodeKind::Graph(graph) => graph.name().to_string(),
            NodeKind::GopArray(array) => array.name().to_string(),
            NodeKind::Subpatch(_) => String::new(),
        }
    }
}

fn join_label(class: &str, args: &[String]) -> String {
    let mut label = class.to_string();
    for arg in args {
        label.push(' ');
        label.push_str(arg);
    }
    label
}

/// A placed entity of a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: usize,
    position: Option<Point>,
    border: Option<u32>,
    kind: NodeKind,
    data: Vec<Payload>,
}

impl Node {
    /// Create a node. Ids are handed out by [`Canvas::add_node`](super::Canvas::add_node).
    pub(crate) fn new(id: usize, kind: NodeKind, position: Option<Point>) -> Self {
        Self {
            id,
            position,
            border: None,
            kind,
            data: Vec::new(),
        }
    }

    /// The stable id, unique within the owning canvas.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = Some(position);
    }

    pub fn clear_position(&mut self) {
        self.position = None;
    }

    /// Box width in characters, written as a trailing `f <n>`.
    pub fn border(&self) -> Option<u32> {
        self.border
    }

    pub fn set_border(&mut self, border: u32) {
        self.border = Some(border);
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Payloads of the `#A` statements following the node.
    pub fn data(&self) -> &[Payload] {
        &self.data
    }

    pub fn push_payload(&mut self, payload: Payload) {
        self.data.push(payload);
    }

    /// The canvas of a subpatch node.
    pub fn subpatch(&self) -> Option<CanvasId> {
        match self.kind {
            NodeKind::Subpatch(id) => Some(id),
            _ => None,
        }
    }

    /// Estimate the on-screen size of the node.
    ///
    /// Boxes are two font sizes high and half a font size wide per character;
    /// widgets with a declared size use it. `title` is the label of a
    /// subpatch box, which lives on its canvas.
    pub fn estimated_size(&self, font: f32, title: Option<&str>) -> Size {
        if let NodeKind::Widget(widget) = &self.kind {
            if let Some(size) = widget.declared_size(font) {
                return size;
            }
        }
        let chars = match (self.border, title) {
            (Some(border), _) => border as usize,
            (None, Some(title)) => title.chars().count(),
            (None, None) => self.kind.label().chars().count(),
        };
        Size::new(chars.max(3) as f32 * font / 2.0, font * 2.0)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_factory_tags() {
        for tag in NodeKind::TAGS {
            let kind = NodeKind::empty(tag).unwrap();
            assert_eq!(kind.tag(), tag);
        }
        assert_eq!(
            NodeKind::empty("Subpatch"),
            Err(ModelError::UnknownTag("Subpatch".to_string()))
        );
        assert!(NodeKind::empty("Nope").is_err());
    }

    #[test]
    fn test_has_position() {
        assert!(NodeKind::empty("Object").unwrap().has_position());
        assert!(NodeKind::Subpatch(CanvasId::ROOT).has_position());
        assert!(!NodeKind::empty("Scalar").unwrap().has_position());
        assert!(!NodeKind::empty("GopArray").unwrap().has_position());
    }

    #[test]
    fn test_estimated_size_from_label() {
        let node = Node::new(0, NodeKind::Object(Object::new("osc~", ["440"])), None);
        let size = node.estimated_size(12.0, None);
        // "osc~ 440" is 8 characters wide
        assert_approx_eq!(f32, size.width(), 48.0);
        assert_approx_eq!(f32, size.height(), 24.0);
    }

    #[test]
    fn test_estimated_size_prefers_border() {
        let mut node = Node::new(0, NodeKind::Object(Object::new("t", ["b", "b"])), None);
        node.set_border(20);
        assert_approx_eq!(f32, node.estimated_size(10.0, None).width(), 100.0);
    }

    #[test]
    fn test_estimated_size_of_widget() {
        let tgl = Widget::new("tgl", vec!["25".to_string()]).unwrap();
        let node = Node::new(3, NodeKind::Widget(tgl), None);
        let size = node.estimated_size(12.0, None);
        assert_approx_eq!(f32, size.width(), 25.0);
        assert_approx_eq!(f32, size.height(), 25.0);
    }
}
