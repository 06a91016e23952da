//! The root aggregate and the canvas arena.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    ModelError, atom,
    geometry::{Point, Size},
};

use super::{Canvas, Dependencies, Node, NodeKind, StructTemplate};

/// Index of a canvas in the arena of its [`Patch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanvasId(usize);

impl CanvasId {
    /// The root canvas, always the first one in the arena.
    pub const ROOT: CanvasId = CanvasId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "canvas#{}", self.0)
    }
}

/// A complete patch document.
///
/// The root canvas is created together with the patch. Nested canvases are
/// appended with [`Patch::add_subpatch`], which always gives a child a higher
/// index than its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    name: String,
    encoding: String,
    templates: Vec<StructTemplate>,
    dependencies: Option<Dependencies>,
    canvases: Vec<Canvas>,
}

impl Patch {
    /// Default root window geometry of a new patch.
    pub const DEFAULT_SCREEN: (f32, f32) = (0.0, 50.0);
    pub const DEFAULT_SIZE: (f32, f32) = (450.0, 300.0);
    pub const DEFAULT_FONT: f32 = 12.0;

    /// Create an empty patch with a default root canvas.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MalformedName`] when the name contains a
    /// structural character.
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let (x, y) = Self::DEFAULT_SCREEN;
        let (width, height) = Self::DEFAULT_SIZE;
        let root = Canvas::root("", Point::new(x, y), Size::new(width, height), Self::DEFAULT_FONT);
        Self::with_root(name, root)
    }

    /// Create a patch around an existing root canvas.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MalformedName`] when the name contains a
    /// structural character.
    pub fn with_root(name: impl Into<String>, root: Canvas) -> Result<Self, ModelError> {
        let name = name.into();
        atom::check_name(&name)?;
        Ok(Self {
            name,
            encoding: "utf-8".to_string(),
            templates: Vec::new(),
            dependencies: None,
            canvases: vec![root],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn set_encoding(&mut self, encoding: impl Into<String>) {
        self.encoding = encoding.into();
    }

    pub fn root(&self) -> &Canvas {
        &self.canvases[CanvasId::ROOT.0]
    }

    pub fn root_mut(&mut self) -> &mut Canvas {
        &mut self.canvases[CanvasId::ROOT.0]
    }

    pub fn canvas(&self, id: CanvasId) -> Option<&Canvas> {
        self.canvases.get(id.0)
    }

    pub fn canvas_mut(&mut self, id: CanvasId) -> Option<&mut Canvas> {
        self.canvases.get_mut(id.0)
    }

    /// All canvases with their ids, parents before children.
    pub fn canvases(&self) -> impl Iterator<Item = (CanvasId, &Canvas)> {
        self.canvases
            .iter()
            .enumerate()
            .map(|(index, canvas)| (CanvasId(index), canvas))
    }

    pub fn canvas_count(&self) -> usize {
        self.canvases.len()
    }

    /// Canvas ids in nesting order: every canvas comes before the canvases
    /// nested in it, and sibling subpatches follow their node order.
    pub fn preorder(&self) -> Vec<CanvasId> {
        let mut order = Vec::with_capacity(self.canvases.len());
        let mut stack = vec![CanvasId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(canvas) = self.canvas(id) {
                stack.extend(canvas.nodes().iter().rev().filter_map(Node::subpatch));
            }
        }
        order
    }

    /// Nest `canvas` inside `parent` and append the node that stands for it.
    ///
    /// Returns the id of the new canvas and the node id it received in the
    /// parent. The nested canvas inherits the font size of its parent.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingCanvas`] when `parent` is not part of
    /// this patch.
    pub fn add_subpatch(
        &mut self,
        parent: CanvasId,
        mut canvas: Canvas,
        position: Option<Point>,
    ) -> Result<(CanvasId, usize), ModelError> {
        let font = self
            .canvas(parent)
            .ok_or(ModelError::MissingCanvas(parent.0))?
            .font();
        let id = CanvasId(self.canvases.len());
        canvas.set_parent(parent);
        canvas.set_font(font);
        self.canvases.push(canvas);

        let parent = &mut self.canvases[parent.0];
        let node = parent.add_node(NodeKind::Subpatch(id), position);
        Ok((id, node))
    }

    /// Like [`Patch::add_subpatch`] but with a node id chosen by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingCanvas`] when `parent` is not part of
    /// this patch.
    pub fn add_subpatch_with_id(
        &mut self,
        parent: CanvasId,
        node: usize,
        mut canvas: Canvas,
        position: Option<Point>,
    ) -> Result<(CanvasId, usize), ModelError> {
        let font = self
            .canvas(parent)
            .ok_or(ModelError::MissingCanvas(parent.0))?
            .font();
        let id = CanvasId(self.canvases.len());
        canvas.set_parent(parent);
        canvas.set_font(font);
        self.canvases.push(canvas);

        let parent = &mut self.canvases[parent.0];
        let node = parent.add_node_with_id(node, NodeKind::Subpatch(id), position);
        Ok((id, node))
    }

    pub fn templates(&self) -> &[StructTemplate] {
        &self.templates
    }

    /// Register a template. A later template with the same name replaces the
    /// earlier one in place.
    pub fn add_template(&mut self, template: StructTemplate) {
        match self
            .templates
            .iter_mut()
            .find(|existing| existing.name() == template.name())
        {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    pub fn template(&self, name: &str) -> Option<&StructTemplate> {
        self.templates.iter().find(|template| template.name() == name)
    }

    pub fn dependencies(&self) -> Option<&Dependencies> {
        self.dependencies.as_ref()
    }

    /// Merge search paths and libraries into the patch dependencies.
    pub fn merge_dependencies(&mut self, dependencies: Dependencies) {
        match &mut self.dependencies {
            Some(existing) => existing.merge(dependencies),
            None => self.dependencies = Some(dependencies),
        }
    }
}
