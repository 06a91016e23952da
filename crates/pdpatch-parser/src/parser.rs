//! Canvas-stack parser.
//!
//! Statements are consumed in order by a small state machine. Before the
//! first `#N canvas` only template declarations are accepted; afterwards a
//! stack of open canvases tracks where nodes go. `#N canvas` pushes a
//! nested canvas and `#X restore` pops it again.
//!
//! Statements that cannot be understood are reported as warnings and
//! skipped. Only a broken canvas stack aborts the parse.

use log::{debug, trace};

use pdpatch_core::{
    atom::{check_name, decode_number, unescape},
    geometry::{Area, Point, Size},
    model::{
        Canvas, CanvasId, Comment, Connection, Coords, DataBlock, DataBlockKind, Dependencies,
        FieldKind, GopArray, Graph, GraphArray, Message, NodeKind, Object, Patch, Payload,
        ScalarInstance, StructField, StructTemplate, Widget, WidgetKind,
    },
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    statement::{Statement, decode_border, segments},
    template,
};

/// Where `#A` data and `#X f` borders of the following statements go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Node { canvas: CanvasId, id: usize },
    /// The last array of a legacy graph node.
    GraphArray { canvas: CanvasId, id: usize },
    Comment(CanvasId),
    Canvas(CanvasId),
}

/// An open canvas.
#[derive(Debug, Clone, Copy)]
struct Frame {
    canvas: CanvasId,
    /// Node standing for the canvas in its parent, `None` for the root.
    node: Option<usize>,
    /// Span of the `#N canvas` statement.
    span: Span,
}

/// State threaded through the parse of one source.
struct ParseContext<'a> {
    name: &'a str,
    patch: Option<Patch>,
    /// Templates declared before the root canvas.
    pending_templates: Vec<StructTemplate>,
    stack: Vec<Frame>,
    target: Option<Target>,
    /// The legacy graph node collecting `#X array` statements.
    graph: Option<(CanvasId, usize)>,
    diagnostics: DiagnosticCollector,
}

/// Build a patch from lexed statements.
///
/// `source_len` is the length of the source the statements were lexed
/// from, used to point at the end of the input.
///
/// # Errors
///
/// Returns a [`ParseError`] when the name is malformed, when there is no
/// root canvas or when the canvas stack is unbalanced.
pub fn build_patch(
    statements: &[Statement],
    name: &str,
    source_len: usize,
) -> Result<Patch, ParseError> {
    if let Err(err) = check_name(name) {
        return Err(Diagnostic::error(err.to_string())
            .with_code(ErrorCode::E105)
            .with_help("patch names may not contain `; $ & | , % *` or a backquote")
            .into());
    }

    let mut context = ParseContext::new(name);
    for statement in statements {
        context.statement(statement);
    }
    context.finish(Span::new(source_len..source_len))
}

fn decode_position(args: &[String]) -> Option<Point> {
    match args {
        [x, y, ..] => Some(Point::new(decode_number(x)?, decode_number(y)?)),
        _ => None,
    }
}

fn decode_index(field: &str) -> Option<usize> {
    decode_number(field)
        .filter(|value| *value >= 0.0 && value.fract() == 0.0)
        .map(|value| value as usize)
}

fn decode_all(fields: &[String]) -> Option<Vec<f32>> {
    fields.iter().map(|field| decode_number(field)).collect()
}

fn unescape_all(fields: &[String]) -> Vec<String> {
    fields.iter().map(|field| unescape(field)).collect()
}

impl<'a> ParseContext<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            name,
            patch: None,
            pending_templates: Vec::new(),
            stack: Vec::new(),
            target: None,
            graph: None,
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn statement(&mut self, statement: &Statement) {
        trace!(fields:? = statement.fields(); "Statement");
        if !statement.is_terminated() {
            self.warn(statement, ErrorCode::E001, "statement has no terminating `;`");
        }

        match statement.head() {
            ("#N", "canvas") => self.canvas(statement),
            ("#N", "struct") => self.structure(statement),
            ("#A", _) => self.array_data(statement),
            ("#X", keyword) => {
                if self.patch.is_none() {
                    self.warn(
                        statement,
                        ErrorCode::E106,
                        format!("`#X {keyword}` before the root canvas"),
                    );
                    return;
                }
                match keyword {
                    "obj" => self.object(statement),
                    "msg" => self.message(statement),
                    "floatatom" | "symbolatom" | "listbox" => self.atom_box(statement, keyword),
                    "text" => self.comment(statement),
                    "scalar" => self.scalar(statement),
                    "connect" => self.connect(statement),
                    "coords" => self.coords(statement),
                    "restore" => self.restore(statement),
                    "f" => self.border(statement),
                    "graph" => self.graph(statement),
                    "array" => self.array(statement),
                    "pop" => self.pop(statement),
                    "declare" => self.declare(statement),
                    _ => self.unknown(statement),
                }
            }
            _ => self.unknown(statement),
        }
    }

    fn finish(mut self, end: Span) -> Result<Patch, ParseError> {
        if self.patch.is_none() {
            self.diagnostics.emit(
                Diagnostic::error("the source has no root canvas")
                    .with_code(ErrorCode::E104)
                    .with_label(end, "input ends here")
                    .with_help("a patch starts with `#N canvas x y width height font;`"),
            );
        }
        if self.stack.len() > 1 {
            let mut diagnostic = Diagnostic::error(format!(
                "{} subpatch(es) are never closed",
                self.stack.len() - 1
            ))
            .with_code(ErrorCode::E103)
            .with_label(end, "input ends here");
            for frame in &self.stack[1..] {
                diagnostic = diagnostic.with_secondary_label(frame.span, "opened here");
            }
            self.diagnostics.emit(
                diagnostic.with_help("add `#X restore x y title;` for every nested `#N canvas`"),
            );
        }

        self.diagnostics.finish()?;
        self.patch.ok_or_else(|| {
            Diagnostic::error("the source has no root canvas")
                .with_code(ErrorCode::E104)
                .into()
        })
    }

    fn warn(&mut self, statement: &Statement, code: ErrorCode, message: impl Into<String>) {
        self.diagnostics.emit(
            Diagnostic::warning(message)
                .with_code(code)
                .with_label(statement.span(), code.description()),
        );
    }

    fn malformed(&mut self, statement: &Statement, expected: &str) {
        let (kind, keyword) = statement.head();
        self.warn(
            statement,
            ErrorCode::E101,
            format!("`{kind} {keyword}` expects {expected}, statement dropped"),
        );
    }

    fn unknown(&mut self, statement: &Statement) {
        let (kind, keyword) = statement.head();
        self.warn(
            statement,
            ErrorCode::E100,
            format!("unknown statement `{kind} {keyword}`, skipped"),
        );
    }

    fn current(&self) -> Option<CanvasId> {
        self.stack.last().map(|frame| frame.canvas)
    }

    fn canvas_mut(&mut self, id: CanvasId) -> Option<&mut Canvas> {
        self.patch.as_mut()?.canvas_mut(id)
    }

    /// Append a node to the current canvas and make it the target.
    fn add_node(&mut self, statement: &Statement, kind: NodeKind, position: Option<Point>) {
        let Some(canvas_id) = self.current() else {
            return;
        };
        let Some(canvas) = self.canvas_mut(canvas_id) else {
            return;
        };
        let id = canvas.add_node(kind, position);
        if let (Some(border), Some(node)) = (statement.border(), canvas.node_mut(id)) {
            node.set_border(border);
        }
        self.target = Some(Target::Node {
            canvas: canvas_id,
            id,
        });
    }

    // =========================================================================
    // Canvases
    // =========================================================================

    fn canvas(&mut self, statement: &Statement) {
        let args = statement.args();
        match (self.patch.is_some(), args.len()) {
            (false, 5) => self.root_canvas(statement),
            (true, 6) => self.nested_canvas(statement),
            (false, 6) => self.warn(
                statement,
                ErrorCode::E106,
                "subpatch header before the root canvas, dropped",
            ),
            (true, 5) => self.malformed(statement, "a name and a visibility flag for a subpatch"),
            _ => self.malformed(statement, "five or six arguments"),
        }
    }

    fn root_canvas(&mut self, statement: &Statement) {
        let Some(values) = decode_all(statement.args()) else {
            self.malformed(statement, "numeric geometry and font size");
            return;
        };
        let root = Canvas::root(
            "",
            Point::new(values[0], values[1]),
            Size::new(values[2], values[3]),
            values[4],
        );
        match Patch::with_root(self.name, root) {
            Ok(mut patch) => {
                for template in self.pending_templates.drain(..) {
                    patch.add_template(template);
                }
                debug!(name = self.name; "Root canvas opened");
                self.patch = Some(patch);
                self.stack.push(Frame {
                    canvas: CanvasId::ROOT,
                    node: None,
                    span: statement.span(),
                });
                self.target = None;
            }
            Err(err) => self.diagnostics.emit(
                Diagnostic::error(err.to_string())
                    .with_code(ErrorCode::E105)
                    .with_label(statement.span(), "while opening the root canvas"),
            ),
        }
    }

    fn nested_canvas(&mut self, statement: &Statement) {
        let args = statement.args();
        let (Some(geometry), Some(visible)) = (decode_all(&args[..4]), decode_number(&args[5]))
        else {
            self.malformed(statement, "numeric geometry and visibility flag");
            return;
        };
        let (Some(parent), Some(patch)) = (self.current(), self.patch.as_mut()) else {
            return;
        };

        let canvas = Canvas::subpatch_unchecked(
            unescape(&args[4]),
            Point::new(geometry[0], geometry[1]),
            Size::new(geometry[2], geometry[3]),
            visible != 0.0,
        );
        match patch.add_subpatch(parent, canvas, None) {
            Ok((canvas, node)) => {
                debug!(canvas:% = canvas, depth = self.stack.len(); "Subpatch opened");
                self.stack.push(Frame {
                    canvas,
                    node: Some(node),
                    span: statement.span(),
                });
                self.target = None;
            }
            Err(err) => self.warn(statement, ErrorCode::E101, err.to_string()),
        }
    }

    fn restore(&mut self, statement: &Statement) {
        if self.stack.len() < 2 {
            self.diagnostics.emit(
                Diagnostic::error("`#X restore` without an open subpatch")
                    .with_code(ErrorCode::E102)
                    .with_label(statement.span(), "nothing to close here")
                    .with_help("remove the statement or add the matching `#N canvas`"),
            );
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let Some(parent) = self.current() else {
            return;
        };
        if self.graph.is_some_and(|(canvas, _)| canvas == frame.canvas) {
            self.graph = None;
        }

        let args = statement.args();
        let position = decode_position(args);
        if position.is_none() {
            self.malformed(statement, "a position");
        }
        if let (Some(position), Some(node)) = (position, frame.node) {
            if let Some(node) = self
                .canvas_mut(parent)
                .and_then(|canvas| canvas.node_mut(node))
            {
                node.set_position(position);
            }
        }

        let border = statement.border();
        if let Some(canvas) = self.canvas_mut(frame.canvas) {
            canvas.set_title(unescape_all(args.get(2..).unwrap_or_default()));
            if let Some(border) = border {
                canvas.set_border(border);
            }
        }
        debug!(canvas:% = frame.canvas; "Subpatch closed");
        self.target = Some(Target::Canvas(frame.canvas));
    }

    fn coords(&mut self, statement: &Statement) {
        let coords = decode_all(statement.args()).and_then(|values| Coords::from_values(&values));
        let Some(coords) = coords else {
            self.malformed(statement, "seven or nine numbers");
            return;
        };
        if let Some(canvas) = self.current().and_then(|id| self.canvas_mut(id)) {
            canvas.set_coords(coords);
        }
    }

    fn connect(&mut self, statement: &Statement) {
        let indices: Option<Vec<usize>> = statement
            .args()
            .iter()
            .map(|field| decode_index(field))
            .collect();
        let Some(&[source, outlet, sink, inlet]) = indices.as_deref() else {
            self.malformed(statement, "four indices");
            return;
        };
        let (Ok(outlet), Ok(inlet)) = (u32::try_from(outlet), u32::try_from(inlet)) else {
            self.malformed(statement, "port indices that fit 32 bits");
            return;
        };
        let connection = Connection::new(source, outlet, sink, inlet);
        if let Some(canvas) = self.current().and_then(|id| self.canvas_mut(id)) {
            canvas.connect(connection);
        }
    }

    fn border(&mut self, statement: &Statement) {
        let Some(border) = statement.args().first().and_then(|field| decode_border(field)) else {
            self.malformed(statement, "a width");
            return;
        };
        match self.target {
            Some(Target::Node { canvas, id }) => {
                if let Some(node) = self.canvas_mut(canvas).and_then(|c| c.node_mut(id)) {
                    node.set_border(border);
                }
            }
            Some(Target::Comment(canvas)) => {
                if let Some(comment) = self.canvas_mut(canvas).and_then(Canvas::last_comment_mut) {
                    comment.set_border(border);
                }
            }
            Some(Target::Canvas(canvas)) => {
                if let Some(canvas) = self.canvas_mut(canvas) {
                    canvas.set_border(border);
                }
            }
            Some(Target::GraphArray { .. }) | None => {
                self.warn(statement, ErrorCode::E101, "`#X f` without a box to apply to");
            }
        }
    }

    fn declare(&mut self, statement: &Statement) {
        let mut dependencies = Dependencies::default();
        let mut args = statement.args().iter();
        while let Some(flag) = args.next() {
            let Some(value) = args.next() else {
                self.malformed(statement, "flag and value pairs");
                break;
            };
            match flag.as_str() {
                "-path" | "-stdpath" => dependencies.add_path(unescape(value)),
                "-lib" | "-stdlib" => dependencies.add_lib(unescape(value)),
                other => {
                    self.warn(
                        statement,
                        ErrorCode::E101,
                        format!("unknown declare flag `{other}`, skipped"),
                    );
                }
            }
        }
        if let Some(patch) = self.patch.as_mut() {
            patch.merge_dependencies(dependencies);
        }
    }

    // =========================================================================
    // Boxes
    // =========================================================================

    fn object(&mut self, statement: &Statement) {
        let args = statement.args();
        let Some(position) = decode_position(args) else {
            self.malformed(statement, "a position");
            return;
        };
        let kind = match args.get(2) {
            None => NodeKind::Object(Object::default()),
            Some(class) => {
                let class = unescape(class);
                let rest = unescape_all(&args[3..]);
                let widget = WidgetKind::from_class(&class).filter(|kind| !kind.is_native());
                if widget.is_some() {
                    match Widget::new(class, rest) {
                        Some(widget) => NodeKind::Widget(widget),
                        None => return,
                    }
                } else if let Some(kind) = DataBlockKind::from_class(&class) {
                    NodeKind::DataBlock(DataBlock::new(kind, rest))
                } else {
                    NodeKind::Object(Object::new(class, rest))
                }
            }
        };
        self.add_node(statement, kind, Some(position));
    }

    fn message(&mut self, statement: &Statement) {
        let args = statement.args();
        let Some(position) = decode_position(args) else {
            self.malformed(statement, "a position");
            return;
        };
        let atoms = unescape_all(&args[2..]);
        self.add_node(
            statement,
            NodeKind::Message(Message::from_atoms(&atoms)),
            Some(position),
        );
    }

    fn atom_box(&mut self, statement: &Statement, keyword: &str) {
        let args = statement.args();
        let Some(position) = decode_position(args) else {
            self.malformed(statement, "a position");
            return;
        };
        let Some(widget) = Widget::new(keyword, unescape_all(&args[2..])) else {
            return;
        };
        self.add_node(statement, NodeKind::Widget(widget), Some(position));
    }

    fn comment(&mut self, statement: &Statement) {
        let args = statement.args();
        let Some(position) = decode_position(args) else {
            self.malformed(statement, "a position");
            return;
        };
        let Some(canvas_id) = self.current() else {
            return;
        };
        let mut comment = Comment::new(Some(position), unescape_all(&args[2..]));
        if let Some(border) = statement.border() {
            comment.set_border(border);
        }
        if let Some(canvas) = self.canvas_mut(canvas_id) {
            canvas.add_comment(comment);
            self.target = Some(Target::Comment(canvas_id));
        }
    }

    // =========================================================================
    // Data
    // =========================================================================

    fn structure(&mut self, statement: &Statement) {
        let Some((name, mut rest)) = statement.args().split_first() else {
            self.malformed(statement, "a template name");
            return;
        };

        let mut fields = Vec::new();
        while let [kind, field, tail @ ..] = rest {
            let (kind, consumed) = match kind.as_str() {
                "float" => (Some(FieldKind::Float), 2),
                "symbol" => (Some(FieldKind::Symbol), 2),
                "text" | "list" => (Some(FieldKind::Text), 2),
                "array" => match tail.first() {
                    Some(template) => (
                        Some(FieldKind::Array {
                            template: unescape(template),
                        }),
                        3,
                    ),
                    None => {
                        self.malformed(statement, "an element template for array fields");
                        rest = &[];
                        break;
                    }
                },
                other => {
                    self.warn(
                        statement,
                        ErrorCode::E201,
                        format!("unknown field type `{other}`, field skipped"),
                    );
                    (None, 2)
                }
            };
            if let Some(kind) = kind {
                fields.push(StructField::new(unescape(field), kind));
            }
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            self.malformed(statement, "type and name pairs");
        }

        let template = StructTemplate::new(unescape(name), fields);
        debug!(template = template.name(), fields = template.fields().len(); "Template declared");
        match self.patch.as_mut() {
            Some(patch) => patch.add_template(template),
            None => self.pending_templates.push(template),
        }
    }

    fn scalar(&mut self, statement: &Statement) {
        let Some((name, rest)) = statement.args().split_first() else {
            self.malformed(statement, "a template name");
            return;
        };
        let name = unescape(name);
        let Some(patch) = self.patch.as_ref() else {
            return;
        };

        let segments = segments(rest);
        let data = match patch.template(&name) {
            Some(found) => template::fill(found, &segments, patch.templates()),
            None => {
                self.warn(
                    statement,
                    ErrorCode::E200,
                    format!("scalar of undefined template `{name}`, data dropped"),
                );
                None
            }
        };
        self.add_node(
            statement,
            NodeKind::Scalar(ScalarInstance::new(name, data)),
            None,
        );
    }

    fn graph(&mut self, statement: &Statement) {
        let args = statement.args();
        let values = args.get(1..).and_then(decode_all);
        let (Some(name), Some(values)) = (args.first(), values) else {
            self.malformed(statement, "a name and eight numbers");
            return;
        };
        if values.len() != 8 {
            self.malformed(statement, "a name and eight numbers");
            return;
        }
        let graph = Graph::new(
            unescape(name),
            Area::from_values([values[0], values[1], values[2], values[3]]),
            Area::from_values([values[4], values[5], values[6], values[7]]),
        );
        self.add_node(statement, NodeKind::Graph(graph), None);
        if let Some(Target::Node { canvas, id }) = self.target {
            self.graph = Some((canvas, id));
        }
    }

    fn array(&mut self, statement: &Statement) {
        let args = statement.args();
        let (name, length, element) = match args {
            [name, length, element, ..] => match decode_index(length) {
                Some(length) => (unescape(name), length, unescape(element)),
                None => {
                    self.malformed(statement, "a numeric length");
                    return;
                }
            },
            _ => {
                self.malformed(statement, "a name, a length and an element type");
                return;
            }
        };

        if let Some((canvas, id)) = self.graph {
            let graph = self
                .canvas_mut(canvas)
                .and_then(|c| c.node_mut(id))
                .and_then(|node| match node.kind_mut() {
                    NodeKind::Graph(graph) => Some(graph),
                    _ => None,
                });
            if let Some(graph) = graph {
                graph.add_array(GraphArray::new(name, length, element));
                self.target = Some(Target::GraphArray { canvas, id });
            }
            return;
        }

        let Some(flags) = args.get(3).and_then(|field| decode_index(field)) else {
            self.malformed(statement, "a flags argument");
            return;
        };
        self.add_node(
            statement,
            NodeKind::GopArray(GopArray::new(name, length, element, flags as u32)),
            None,
        );
    }

    fn pop(&mut self, statement: &Statement) {
        if self.graph.take().is_none() {
            self.warn(statement, ErrorCode::E101, "`#X pop` outside of a graph");
        }
    }

    fn array_data(&mut self, statement: &Statement) {
        let fields = statement.split_decoration().0;
        let Some(header) = fields.get(1) else {
            self.malformed(statement, "a header");
            return;
        };
        let data = &fields[2..];

        let payload = if let Some(offset) = decode_index(header) {
            let values: Vec<f32> = data
                .iter()
                .map(|field| decode_number(field).unwrap_or_default())
                .collect();
            Payload::Floats { offset, values }
        } else {
            match header.as_str() {
                "saved" => Payload::Saved {
                    atoms: unescape_all(data),
                },
                "set" => Payload::Set {
                    rows: segments(data).into_iter().map(unescape_all).collect(),
                },
                other => {
                    self.warn(
                        statement,
                        ErrorCode::E100,
                        format!("unknown data header `{other}`, skipped"),
                    );
                    return;
                }
            }
        };

        match self.target {
            Some(Target::Node { canvas, id }) => {
                if let Some(node) = self.canvas_mut(canvas).and_then(|c| c.node_mut(id)) {
                    node.push_payload(payload);
                }
            }
            Some(Target::GraphArray { canvas, id }) => {
                let array = self
                    .canvas_mut(canvas)
                    .and_then(|c| c.node_mut(id))
                    .and_then(|node| match node.kind_mut() {
                        NodeKind::Graph(graph) => graph.last_array_mut(),
                        _ => None,
                    });
                if let Some(array) = array {
                    array.push_payload(payload);
                }
            }
            Some(Target::Comment(_) | Target::Canvas(_)) | None => {
                self.warn(statement, ErrorCode::E101, "`#A` without a node to attach to");
            }
        }
    }
}
