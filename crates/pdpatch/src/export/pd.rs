//! Native patch text writer.
//!
//! The patch is written in a fixed order: templates, then the root canvas
//! with everything nested in it, then the `declare` statement. Inside a
//! canvas, nodes come in creation order and a subpatch node is replaced by
//! the full text of its canvas. Comments follow the nodes. The root canvas
//! writes its coords before its connections, nested canvases the other way
//! round, followed by the `restore` line and an optional `#X f` width.
//!
//! Nesting is walked with an explicit stack of frames.

use std::collections::HashMap;

use log::{debug, warn};

use pdpatch_core::{
    atom::{ESCAPED_SEMICOLON, escape, format_number},
    geometry::Point,
    model::{
        Canvas, CanvasId, Comment, Dependencies, FieldKind, Node, NodeKind, Patch, Payload,
        ScalarData, StructTemplate,
    },
};

use super::{Error, Exporter};

/// Terminates every statement.
pub const TERMINATOR: &str = ";\r\n";

/// Writes patches as native patch text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdExporter;

impl Exporter for PdExporter {
    fn export(&self, patch: &Patch) -> Result<String, Error> {
        Ok(write_patch(patch))
    }
}

/// One pending piece of output.
#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Header and nodes of a canvas. `restore` is the position of its box in
    /// the parent canvas, `None` for the root.
    Open {
        canvas: CanvasId,
        restore: Option<Point>,
    },
    Node {
        canvas: CanvasId,
        index: usize,
    },
    /// Comments, connections, coords and restore line of a canvas.
    Close {
        canvas: CanvasId,
        restore: Option<Point>,
    },
}

/// Render a patch to text.
pub fn write_patch(patch: &Patch) -> String {
    let mut writer = Writer::default();
    for template in patch.templates() {
        writer.template(template);
    }

    let mut stack = vec![Frame::Open {
        canvas: CanvasId::ROOT,
        restore: None,
    }];
    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Open { canvas: id, restore } => {
                let Some(canvas) = patch.canvas(id) else {
                    continue;
                };
                writer.canvas_header(canvas);
                stack.push(Frame::Close {
                    canvas: id,
                    restore,
                });
                stack.extend(
                    (0..canvas.nodes().len())
                        .rev()
                        .map(|index| Frame::Node { canvas: id, index }),
                );
            }
            Frame::Node { canvas, index } => {
                let Some(node) = patch.canvas(canvas).and_then(|c| c.nodes().get(index)) else {
                    continue;
                };
                match node.kind() {
                    NodeKind::Subpatch(nested) => stack.push(Frame::Open {
                        canvas: *nested,
                        restore: Some(node.position().unwrap_or_default()),
                    }),
                    _ => writer.node(node),
                }
            }
            Frame::Close { canvas: id, restore } => {
                if let Some(canvas) = patch.canvas(id) {
                    writer.canvas_trailer(canvas, restore);
                }
            }
        }
    }

    if let Some(dependencies) = patch.dependencies().filter(|deps| !deps.is_empty()) {
        writer.declare(dependencies);
    }
    debug!(statements = writer.statements; "Patch text written");
    writer.out
}

fn escaped(atoms: &[String]) -> impl Iterator<Item = String> + '_ {
    atoms.iter().map(|atom| escape(atom))
}

fn position_fields(position: Option<Point>) -> [String; 2] {
    let position = position.unwrap_or_default();
    [format_number(position.x()), format_number(position.y())]
}

/// Append the flat values and arrays of a record in scalar statement
/// layout.
fn scalar_fields(fields: &mut Vec<String>, data: &ScalarData) {
    fields.extend(data.atoms().iter().map(|atom| escape(atom)));
    fields.push(ESCAPED_SEMICOLON.to_string());
    for array in data.arrays() {
        for element in array.elements() {
            fields.extend(element.atoms().iter().map(|atom| escape(atom)));
            fields.push(ESCAPED_SEMICOLON.to_string());
        }
        fields.push(ESCAPED_SEMICOLON.to_string());
    }
}

#[derive(Default)]
struct Writer {
    out: String,
    statements: usize,
}

impl Writer {
    fn statement(&mut self, fields: Vec<String>, border: Option<u32>) {
        self.out.push_str(&fields.join(" "));
        if let Some(border) = border {
            self.out.push_str(&format!(", f {border}"));
        }
        self.out.push_str(TERMINATOR);
        self.statements += 1;
    }

    fn head(kind: &str, keyword: &str) -> Vec<String> {
        vec![kind.to_string(), keyword.to_string()]
    }

    fn template(&mut self, template: &StructTemplate) {
        let mut fields = Self::head("#N", "struct");
        fields.push(escape(template.name()));
        for field in template.fields() {
            fields.push(field.kind().keyword().to_string());
            fields.push(escape(field.name()));
            if let FieldKind::Array { template } = field.kind() {
                fields.push(escape(template));
            }
        }
        self.statement(fields, None);
    }

    fn canvas_header(&mut self, canvas: &Canvas) {
        let mut fields = Self::head("#N", "canvas");
        fields.extend([
            format_number(canvas.screen().x()),
            format_number(canvas.screen().y()),
            format_number(canvas.size().width()),
            format_number(canvas.size().height()),
        ]);
        if canvas.is_root() {
            fields.push(format_number(canvas.font()));
        } else {
            fields.push(escape(canvas.name()));
            fields.push(u8::from(canvas.is_visible()).to_string());
        }
        self.statement(fields, None);
    }

    fn canvas_trailer(&mut self, canvas: &Canvas, restore: Option<Point>) {
        for comment in canvas.comments() {
            self.comment(comment);
        }
        if canvas.is_root() {
            self.coords(canvas);
            self.connections(canvas);
        } else {
            self.connections(canvas);
            self.coords(canvas);
        }

        let Some(restore) = restore else {
            return;
        };
        let mut fields = Self::head("#X", "restore");
        fields.extend(position_fields(Some(restore)));
        if canvas.title().is_empty() {
            fields.push("pd".to_string());
            fields.push(escape(canvas.name()));
        } else {
            fields.extend(escaped(canvas.title()));
        }
        self.statement(fields, None);
        if let Some(border) = canvas.border() {
            self.statement(vec!["#X".to_string(), "f".to_string(), border.to_string()], None);
        }
    }

    fn coords(&mut self, canvas: &Canvas) {
        if let Some(coords) = canvas.coords() {
            let mut fields = Self::head("#X", "coords");
            fields.extend(coords.values().into_iter().map(format_number));
            self.statement(fields, None);
        }
    }

    /// Write the connections of a canvas with endpoints remapped from
    /// stable ids to output indices.
    fn connections(&mut self, canvas: &Canvas) {
        let indices: HashMap<usize, usize> = canvas
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id(), index))
            .collect();

        for connection in canvas.connections() {
            let (Some(source), Some(sink)) = (
                indices.get(&connection.source()),
                indices.get(&connection.sink()),
            ) else {
                warn!(
                    canvas = canvas.name(),
                    source = connection.source(),
                    sink = connection.sink();
                    "Dangling connection dropped"
                );
                continue;
            };
            let mut fields = Self::head("#X", "connect");
            fields.extend([
                source.to_string(),
                connection.outlet().to_string(),
                sink.to_string(),
                connection.inlet().to_string(),
            ]);
            self.statement(fields, None);
        }
    }

    fn comment(&mut self, comment: &Comment) {
        let mut fields = Self::head("#X", "text");
        fields.extend(position_fields(comment.position()));
        fields.extend(escaped(comment.atoms()));
        self.statement(fields, comment.border());
    }

    fn declare(&mut self, dependencies: &Dependencies) {
        let mut fields = Self::head("#X", "declare");
        for path in dependencies.paths() {
            fields.push("-path".to_string());
            fields.push(escape(path));
        }
        for lib in dependencies.libs() {
            fields.push("-lib".to_string());
            fields.push(escape(lib));
        }
        self.statement(fields, None);
    }

    fn node(&mut self, node: &Node) {
        let position = position_fields(node.position());
        let border = node.border();
        match node.kind() {
            NodeKind::Object(object) => {
                let mut fields = Self::head("#X", "obj");
                fields.extend(position);
                if !object.class().is_empty() {
                    fields.push(escape(object.class()));
                    fields.extend(escaped(object.args()));
                }
                self.statement(fields, border);
            }
            NodeKind::Message(message) => {
                let mut fields = Self::head("#X", "msg");
                fields.extend(position);
                fields.extend(escaped(&message.to_atoms()));
                self.statement(fields, border);
            }
            NodeKind::Widget(widget) => {
                let mut fields = if widget.kind().is_native() {
                    let mut fields = Self::head("#X", widget.class());
                    fields.extend(position);
                    fields
                } else {
                    let mut fields = Self::head("#X", "obj");
                    fields.extend(position);
                    fields.push(escape(widget.class()));
                    fields
                };
                fields.extend(escaped(widget.fields()));
                self.statement(fields, border);
            }
            NodeKind::DataBlock(block) => {
                let mut fields = Self::head("#X", "obj");
                fields.extend(position);
                fields.push(block.kind().as_str().to_string());
                fields.extend(escaped(block.args()));
                self.statement(fields, border);
            }
            NodeKind::Scalar(scalar) => {
                let mut fields = Self::head("#X", "scalar");
                fields.push(escape(scalar.template()));
                if let Some(data) = scalar.data() {
                    scalar_fields(&mut fields, data);
                }
                self.statement(fields, None);
            }
            NodeKind::Graph(graph) => {
                let mut fields = Self::head("#X", "graph");
                fields.push(escape(graph.name()));
                fields.extend(graph.range().values().into_iter().map(format_number));
                fields.extend(graph.area().values().into_iter().map(format_number));
                self.statement(fields, None);
                for array in graph.arrays() {
                    let mut fields = Self::head("#X", "array");
                    fields.extend([
                        escape(array.name()),
                        array.length().to_string(),
                        escape(array.element()),
                    ]);
                    self.statement(fields, None);
                    self.payloads(array.data());
                }
                self.statement(Self::head("#X", "pop"), None);
            }
            NodeKind::GopArray(array) => {
                let mut fields = Self::head("#X", "array");
                fields.extend([
                    escape(array.name()),
                    array.length().to_string(),
                    escape(array.element()),
                    array.flags().to_string(),
                ]);
                self.statement(fields, None);
            }
            NodeKind::Subpatch(_) => {}
        }
        self.payloads(node.data());
    }

    fn payloads(&mut self, payloads: &[Payload]) {
        for payload in payloads {
            let mut fields = vec!["#A".to_string(), payload.header()];
            match payload {
                Payload::Floats { values, .. } => {
                    fields.extend(values.iter().copied().map(format_number));
                }
                Payload::Saved { atoms } => fields.extend(escaped(atoms)),
                Payload::Set { rows } => {
                    for row in rows {
                        fields.extend(escaped(row));
                        fields.push(ESCAPED_SEMICOLON.to_string());
                    }
                }
            }
            self.statement(fields, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use pdpatch_core::{
        geometry::Size,
        model::{
            ArrayBinding, Binding, Connection, DataBlock, DataBlockKind, Message, MessageTarget,
            Object, ScalarInstance, StructField,
        },
    };

    use super::*;

    fn object(class: &str, args: &[&str]) -> NodeKind {
        NodeKind::Object(Object::new(class, args.iter().copied()))
    }

    fn lines(text: &str) -> Vec<&str> {
        text.split_terminator(TERMINATOR).collect()
    }

    #[test]
    fn test_connections_use_output_indices() {
        let mut patch = Patch::new("remap").unwrap();
        let root = patch.root_mut();
        root.add_comment(Comment::new(Some(Point::new(0.0, 0.0)), vec!["hi".to_string()]));
        let a = root.add_node(object("loadbang", &[]), Some(Point::new(10.0, 10.0)));
        let b = root.add_node(object("print", &[]), Some(Point::new(10.0, 30.0)));
        root.connect(Connection::new(a, 0, b, 0));
        root.connect(Connection::new(a, 0, 99, 0));

        let text = write_patch(&patch);

        assert_eq!(a, 1);
        assert_eq!(
            lines(&text),
            [
                "#N canvas 0 50 450 300 12",
                "#X obj 10 10 loadbang",
                "#X obj 10 30 print",
                "#X text 0 0 hi",
                "#X connect 0 0 1 0",
            ]
        );
    }

    #[test]
    fn test_atoms_are_escaped() {
        let mut patch = Patch::new("esc").unwrap();
        let root = patch.root_mut();
        root.add_node(object("r", &["$0-in"]), None);
        let message = Message::new(vec![
            MessageTarget::outlet(vec![vec!["1".to_string()], vec!["2".to_string()]]),
            MessageTarget::send("pd", vec![vec!["dsp".to_string(), "1".to_string()]]),
        ]);
        let id = root.add_node(NodeKind::Message(message), Some(Point::new(5.0, 5.0)));
        root.node_mut(id).unwrap().set_border(12);

        let text = write_patch(&patch);

        assert_eq!(
            lines(&text)[1..],
            [
                "#X obj 0 0 r \\$0-in",
                "#X msg 5 5 1 \\, 2 \\; pd dsp 1, f 12",
            ]
        );
    }

    #[test]
    fn test_nested_canvas_order() {
        let mut patch = Patch::new("outer").unwrap();
        let sub = Canvas::subpatch("inner", Point::new(0.0, 0.0), Size::new(100.0, 80.0), false)
            .unwrap();
        let (inner, _) = patch
            .add_subpatch(CanvasId::ROOT, sub, Some(Point::new(40.0, 60.0)))
            .unwrap();
        let canvas = patch.canvas_mut(inner).unwrap();
        let a = canvas.add_node(object("inlet", &[]), Some(Point::new(1.0, 1.0)));
        let b = canvas.add_node(object("outlet", &[]), Some(Point::new(1.0, 40.0)));
        canvas.connect(Connection::new(a, 0, b, 0));
        canvas.set_border(30);
        patch
            .root_mut()
            .add_node(object("f", &[]), Some(Point::new(2.0, 2.0)));

        let text = write_patch(&patch);

        assert_eq!(
            lines(&text),
            [
                "#N canvas 0 50 450 300 12",
                "#N canvas 0 0 100 80 inner 0",
                "#X obj 1 1 inlet",
                "#X obj 1 40 outlet",
                "#X connect 0 0 1 0",
                "#X restore 40 60 pd inner",
                "#X f 30",
                "#X obj 2 2 f",
            ]
        );
    }

    #[test]
    fn test_scalar_layout() {
        let mut patch = Patch::new("data").unwrap();
        patch.add_template(StructTemplate::new(
            "pt",
            vec![StructField::new("x", FieldKind::Float)],
        ));
        let element = |x: f32| ScalarData::new(vec![Binding::new("x", x)], vec![], vec![]);
        let data = ScalarData::new(
            vec![Binding::new("y", 2.5)],
            vec![Binding::new("color", "dark red".to_string())],
            vec![ArrayBinding::new("points", "pt", vec![element(0.0), element(5.0)])],
        );
        let root = patch.root_mut();
        root.add_node(NodeKind::Scalar(ScalarInstance::new("shape", Some(data))), None);
        root.add_node(NodeKind::Scalar(ScalarInstance::new("empty", None)), None);

        let text = write_patch(&patch);

        assert_eq!(
            lines(&text),
            [
                "#N struct pt float x",
                "#N canvas 0 50 450 300 12",
                "#X scalar shape 2.5 dark\\ red \\; 0 \\; 5 \\; \\;",
                "#X scalar empty",
            ]
        );
    }

    #[test]
    fn test_payloads_and_declare() {
        let mut patch = Patch::new("arrays").unwrap();
        let mut deps = Dependencies::default();
        deps.add_path("abs");
        deps.add_lib("zexy");
        patch.merge_dependencies(deps);

        let root = patch.root_mut();
        let id = root.add_node(
            NodeKind::DataBlock(DataBlock::new(
                DataBlockKind::Text,
                vec!["define".to_string(), "t".to_string()],
            )),
            Some(Point::new(0.0, 0.0)),
        );
        let node = root.node_mut(id).unwrap();
        node.push_payload(Payload::Set {
            rows: vec![vec!["a".to_string()], vec!["b".to_string(), "c".to_string()]],
        });
        node.push_payload(Payload::Floats {
            offset: 3,
            values: vec![0.5, -1.0],
        });

        let text = write_patch(&patch);

        assert_eq!(
            lines(&text)[1..],
            [
                "#X obj 0 0 text define t",
                "#A set a \\; b c \\;",
                "#A 3 0.5 -1",
                "#X declare -path abs -lib zexy",
            ]
        );
    }
}
