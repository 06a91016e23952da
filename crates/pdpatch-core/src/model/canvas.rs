//! Canvases: the node containers of a patch.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    ModelError, atom,
    geometry::{Area, Point, Size},
};

use super::{CanvasId, Comment, Connection, Node, NodeKind};

/// Display coordinates of a canvas (`#X coords ...`).
///
/// Written as 7 values (`x1 y1 x2 y2 w h gop`) or 9 when a graph-on-parent
/// margin is present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    range: Area,
    size: Size,
    gop: u32,
    #[serde(default)]
    margin: Option<Point>,
}

impl Coords {
    pub fn new(range: Area, size: Size, gop: u32, margin: Option<Point>) -> Self {
        Self {
            range,
            size,
            gop,
            margin,
        }
    }

    /// Build coords from the statement values, or `None` unless there are
    /// exactly 7 or 9 of them.
    pub fn from_values(values: &[f32]) -> Option<Self> {
        let margin = match values.len() {
            7 => None,
            9 => Some(Point::new(values[7], values[8])),
            _ => return None,
        };
        Some(Self {
            range: Area::from_values([values[0], values[1], values[2], values[3]]),
            size: Size::new(values[4], values[5]),
            gop: values[6] as u32,
            margin,
        })
    }

    /// The statement values in order.
    pub fn values(&self) -> Vec<f32> {
        let mut values = self.range.values().to_vec();
        values.extend([self.size.width(), self.size.height(), self.gop as f32]);
        if let Some(margin) = self.margin {
            values.extend([margin.x(), margin.y()]);
        }
        values
    }

    pub fn range(&self) -> Area {
        self.range
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Graph-on-parent flags (bit 0: graph on parent, bit 1: hide name).
    pub fn gop(&self) -> u32 {
        self.gop
    }

    pub fn margin(&self) -> Option<Point> {
        self.margin
    }
}

/// A node container corresponding to one patch window.
///
/// The canvas hands out node ids from a counter that only grows. Comments
/// consume a counter value too, so node ids follow the creation order of
/// every box in the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    parent: Option<CanvasId>,
    name: String,
    screen: Point,
    size: Size,
    font: f32,
    visible: bool,
    coords: Option<Coords>,
    title: Vec<String>,
    border: Option<u32>,
    nodes: Vec<Node>,
    comments: Vec<Comment>,
    connections: Vec<Connection>,
    counter: usize,
}

impl Canvas {
    /// Create the root canvas of a patch.
    pub fn root(name: impl Into<String>, screen: Point, size: Size, font: f32) -> Self {
        Self::new(None, name.into(), screen, size, font, true)
    }

    /// Create a nested canvas. The parent is set when it is added to a patch.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MalformedName`] when the name contains a
    /// structural character.
    pub fn subpatch(
        name: impl Into<String>,
        screen: Point,
        size: Size,
        visible: bool,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        atom::check_name(&name)?;
        Ok(Self::subpatch_unchecked(name, screen, size, visible))
    }

    /// Create a nested canvas from a decoded header. Decoded names may
    /// legitimately hold `$` arguments.
    pub fn subpatch_unchecked(
        name: impl Into<String>,
        screen: Point,
        size: Size,
        visible: bool,
    ) -> Self {
        Self::new(None, name.into(), screen, size, 12.0, visible)
    }

    fn new(
        parent: Option<CanvasId>,
        name: String,
        screen: Point,
        size: Size,
        font: f32,
        visible: bool,
    ) -> Self {
        Self {
            parent,
            name,
            screen,
            size,
            font,
            visible,
            coords: None,
            title: Vec::new(),
            border: None,
            nodes: Vec::new(),
            comments: Vec::new(),
            connections: Vec::new(),
            counter: 0,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: CanvasId) {
        self.parent = Some(parent);
    }

    pub(crate) fn set_font(&mut self, font: f32) {
        self.font = font;
    }

    /// The enclosing canvas, `None` for the root.
    pub fn parent(&self) -> Option<CanvasId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Window origin on screen.
    pub fn screen(&self) -> Point {
        self.screen
    }

    /// Window size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Font size. Nested canvases inherit the font of the root.
    pub fn font(&self) -> f32 {
        self.font
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_graph_on_parent(&self) -> bool {
        self.coords.is_some_and(|coords| coords.gop() & 1 == 1)
    }

    pub fn coords(&self) -> Option<Coords> {
        self.coords
    }

    pub fn set_coords(&mut self, coords: Coords) {
        self.coords = Some(coords);
    }

    /// The unescaped title atoms of the `restore` statement, e.g.
    /// `["pd", "mixer"]`.
    pub fn title(&self) -> &[String] {
        &self.title
    }

    pub fn set_title(&mut self, title: Vec<String>) {
        self.title = title;
    }

    /// The title as shown in the parent box, `None` when there is no title.
    pub fn title_text(&self) -> Option<String> {
        (!self.title.is_empty()).then(|| self.title.join(" "))
    }

    pub fn border(&self) -> Option<u32> {
        self.border
    }

    pub fn set_border(&mut self, border: u32) {
        self.border = Some(border);
    }

    /// The current value of the object counter.
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Consume and return the next object index.
    pub fn next_index(&mut self) -> usize {
        let index = self.counter;
        self.counter += 1;
        index
    }

    /// Append a node with the next object index as its id.
    pub fn add_node(&mut self, kind: NodeKind, position: Option<Point>) -> usize {
        let id = self.next_index();
        self.nodes.push(Node::new(id, kind, position));
        id
    }

    /// Append a node with an id chosen by the caller, as read back from a
    /// structured document. The counter moves past the id.
    pub fn add_node_with_id(
        &mut self,
        id: usize,
        kind: NodeKind,
        position: Option<Point>,
    ) -> usize {
        if self.node(id).is_some() {
            warn!(canvas = self.name, id; "Duplicate node id, assigning a fresh one");
            return self.add_node(kind, position);
        }
        self.counter = self.counter.max(id + 1);
        self.nodes.push(Node::new(id, kind, position));
        id
    }

    /// Append a comment. Comments consume an object index but carry no id.
    pub fn add_comment(&mut self, comment: Comment) {
        self.next_index();
        self.comments.push(comment);
    }

    pub fn connect(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Find a node by its stable id.
    pub fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    pub fn node_mut(&mut self, id: usize) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id() == id)
    }

    pub fn last_node_mut(&mut self) -> Option<&mut Node> {
        self.nodes.last_mut()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn comments_mut(&mut self) -> &mut [Comment] {
        &mut self.comments
    }

    pub fn last_comment_mut(&mut self) -> Option<&mut Comment> {
        self.comments.last_mut()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }
}
