//! XML documents.
//!
//! Every entity becomes one element. Node elements carry a `pdpy`
//! attribute naming their variant, so the element name is free to follow
//! the object class (see [`tag::mangle`]). Atoms are `<atom v="..."/>`
//! children; numbers are attributes.
//!
//! ```xml
//! <patch name="synth" encoding="utf-8">
//!   <canvas name="" x="0" y="50" width="450" height="300" font="12" visible="1">
//!     <osc_tilde pdpy="Object" id="0" x="10" y="10" class="osc~">
//!       <atom v="440"/>
//!     </osc_tilde>
//!     <connect source="0" outlet="0" sink="1" inlet="0"/>
//!   </canvas>
//! </patch>
//! ```

pub mod element;
pub mod tag;

use std::{collections::HashMap, slice, str::FromStr};

use log::{debug, trace, warn};

use pdpatch_core::{
    atom::format_number,
    geometry::{Area, Point, Size},
    model::{
        ArrayBinding, Binding, Canvas, CanvasId, Comment, Connection, Coords, DataBlock,
        DataBlockKind, Dependencies, FieldKind, GopArray, Graph, GraphArray, Message,
        MessageTarget, Node, NodeKind, Object, Patch, Payload, ScalarData, ScalarInstance,
        StructField, StructTemplate, Widget,
    },
};

use self::element::Element;
use super::{Error, Exporter, Importer};

/// Writes patches as XML.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlExporter;

impl Exporter for XmlExporter {
    fn export(&self, patch: &Patch) -> Result<String, Error> {
        let text = patch_element(patch)?.to_xml(patch.encoding())?;
        debug!(bytes = text.len(); "XML document written");
        Ok(text)
    }
}

/// Reads patches back from XML.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlImporter;

impl Importer for XmlImporter {
    fn import(&self, text: &str) -> Result<Patch, Error> {
        let root = Element::from_xml(text)?;
        let patch = read_patch(&root)?;
        debug!(canvases = patch.canvas_count(); "XML document read");
        trace!(patch:?; "Patch rebuilt from XML");
        Ok(patch)
    }
}

fn join_numbers(values: impl IntoIterator<Item = f32>) -> String {
    values
        .into_iter()
        .map(format_number)
        .collect::<Vec<_>>()
        .join(" ")
}

fn atom_elements(atoms: &[String]) -> impl Iterator<Item = Element> + '_ {
    atoms
        .iter()
        .map(|atom| Element::new("atom").with_attribute("v", atom.as_str()))
}

fn with_atoms(mut element: Element, atoms: &[String]) -> Element {
    for atom in atom_elements(atoms) {
        element.push(atom);
    }
    element
}

fn set_position(element: &mut Element, position: Option<Point>) {
    if let Some(position) = position {
        element.set_attribute("x", format_number(position.x()));
        element.set_attribute("y", format_number(position.y()));
    }
}

fn set_border(element: &mut Element, border: Option<u32>) {
    if let Some(border) = border {
        element.set_attribute("border", border.to_string());
    }
}

// =========================================================================
// Writing
// =========================================================================

fn patch_element(patch: &Patch) -> Result<Element, Error> {
    let mut root = Element::new("patch")
        .with_attribute("name", patch.name())
        .with_attribute("encoding", patch.encoding());
    for template in patch.templates() {
        root.push(template_element(template));
    }

    // deepest canvases first, so subpatch nodes find their canvas built
    let mut built: HashMap<CanvasId, Element> = HashMap::new();
    for id in patch.preorder().into_iter().rev() {
        let canvas = patch
            .canvas(id)
            .ok_or_else(|| Error::Malformed(format!("{id} is not part of the patch")))?;
        let element = canvas_element(canvas, &mut built)?;
        built.insert(id, element);
    }
    let canvas = built
        .remove(&CanvasId::ROOT)
        .ok_or_else(|| Error::Malformed("the patch has no root canvas".to_string()))?;
    root.push(canvas);

    if let Some(dependencies) = patch.dependencies().filter(|deps| !deps.is_empty()) {
        root.push(declare_element(dependencies));
    }
    Ok(root)
}

fn template_element(template: &StructTemplate) -> Element {
    let mut element = Element::new("template").with_attribute("name", template.name());
    for field in template.fields() {
        let mut child = Element::new("field")
            .with_attribute("type", field.kind().keyword())
            .with_attribute("name", field.name());
        if let FieldKind::Array { template } = field.kind() {
            child.set_attribute("template", template.as_str());
        }
        element.push(child);
    }
    element
}

fn declare_element(dependencies: &Dependencies) -> Element {
    let mut element = Element::new("declare");
    for path in dependencies.paths() {
        element.push(Element::new("path").with_attribute("v", path.as_str()));
    }
    for lib in dependencies.libs() {
        element.push(Element::new("lib").with_attribute("v", lib.as_str()));
    }
    element
}

fn canvas_element(
    canvas: &Canvas,
    built: &mut HashMap<CanvasId, Element>,
) -> Result<Element, Error> {
    let mut element = Element::new("canvas")
        .with_attribute("name", canvas.name())
        .with_attribute("x", format_number(canvas.screen().x()))
        .with_attribute("y", format_number(canvas.screen().y()))
        .with_attribute("width", format_number(canvas.size().width()))
        .with_attribute("height", format_number(canvas.size().height()));
    if canvas.is_root() {
        element.set_attribute("font", format_number(canvas.font()));
    }
    element.set_attribute("visible", u8::from(canvas.is_visible()).to_string());
    if let Some(coords) = canvas.coords() {
        element.set_attribute("coords", join_numbers(coords.values()));
    }
    set_border(&mut element, canvas.border());

    if !canvas.title().is_empty() {
        element.push(with_atoms(Element::new("title"), canvas.title()));
    }
    for node in canvas.nodes() {
        element.push(node_element(node, built)?);
    }
    for comment in canvas.comments() {
        let mut child = with_atoms(Element::new("comment"), comment.atoms());
        set_position(&mut child, comment.position());
        set_border(&mut child, comment.border());
        element.push(child);
    }
    for connection in canvas.connections() {
        element.push(
            Element::new("connect")
                .with_attribute("source", connection.source().to_string())
                .with_attribute("outlet", connection.outlet().to_string())
                .with_attribute("sink", connection.sink().to_string())
                .with_attribute("inlet", connection.inlet().to_string()),
        );
    }
    Ok(element)
}

fn node_element(node: &Node, built: &mut HashMap<CanvasId, Element>) -> Result<Element, Error> {
    let header = |name: &str| {
        let mut element = Element::new(name)
            .with_attribute("pdpy", node.kind().tag())
            .with_attribute("id", node.id().to_string());
        set_position(&mut element, node.position());
        set_border(&mut element, node.border());
        element
    };

    let mut element = match node.kind() {
        NodeKind::Object(object) => with_atoms(
            header(&tag::mangle(object.class())).with_attribute("class", object.class()),
            object.args(),
        ),
        NodeKind::Message(message) => {
            let mut element = header("msg");
            for target in message.targets() {
                let mut child = Element::new("target");
                if let Some(address) = target.address() {
                    child.set_attribute("address", address);
                }
                for atoms in target.messages() {
                    child.push(with_atoms(Element::new("message"), atoms));
                }
                element.push(child);
            }
            element
        }
        NodeKind::Widget(widget) => with_atoms(
            header(&tag::mangle(widget.class())).with_attribute("class", widget.class()),
            widget.fields(),
        ),
        NodeKind::DataBlock(block) => with_atoms(
            header(block.kind().as_str()).with_attribute("kind", block.kind().as_str()),
            block.args(),
        ),
        NodeKind::Scalar(scalar) => {
            let element = header("scalar").with_attribute("template", scalar.template());
            match scalar.data() {
                Some(data) => element.with_child(data_element("data", data)),
                None => element,
            }
        }
        NodeKind::Graph(graph) => {
            let mut element = header("graph")
                .with_attribute("name", graph.name())
                .with_attribute("range", join_numbers(graph.range().values()))
                .with_attribute("area", join_numbers(graph.area().values()));
            for array in graph.arrays() {
                let mut child = Element::new("array")
                    .with_attribute("name", array.name())
                    .with_attribute("length", array.length().to_string())
                    .with_attribute("element", array.element());
                for payload in array.data() {
                    child.push(payload_element(payload));
                }
                element.push(child);
            }
            element
        }
        NodeKind::GopArray(array) => header("array")
            .with_attribute("name", array.name())
            .with_attribute("length", array.length().to_string())
            .with_attribute("element", array.element())
            .with_attribute("flags", array.flags().to_string()),
        NodeKind::Subpatch(id) => {
            let canvas = built
                .remove(id)
                .ok_or_else(|| Error::Malformed(format!("{id} is referenced twice")))?;
            header("subpatch").with_child(canvas)
        }
    };

    for payload in node.data() {
        element.push(payload_element(payload));
    }
    Ok(element)
}

fn data_element(name: &str, data: &ScalarData) -> Element {
    let mut element = Element::new(name);
    for binding in data.floats() {
        element.push(
            Element::new("float")
                .with_attribute("name", binding.name())
                .with_attribute("value", format_number(*binding.value())),
        );
    }
    for binding in data.symbols() {
        element.push(
            Element::new("symbol")
                .with_attribute("name", binding.name())
                .with_attribute("value", binding.value().as_str()),
        );
    }
    for array in data.arrays() {
        let mut child = Element::new("array")
            .with_attribute("name", array.name())
            .with_attribute("template", array.template());
        for item in array.elements() {
            child.push(data_element("element", item));
        }
        element.push(child);
    }
    element
}

fn payload_element(payload: &Payload) -> Element {
    match payload {
        Payload::Floats { offset, values } => Element::new("floats")
            .with_attribute("offset", offset.to_string())
            .with_attribute("values", join_numbers(values.iter().copied())),
        Payload::Saved { atoms } => with_atoms(Element::new("saved"), atoms),
        Payload::Set { rows } => {
            let mut element = Element::new("set");
            for row in rows {
                element.push(with_atoms(Element::new("row"), row));
            }
            element
        }
    }
}

// =========================================================================
// Reading
// =========================================================================

fn required<'a>(element: &'a Element, key: &str) -> Result<&'a str, Error> {
    element.attribute(key).ok_or_else(|| {
        Error::Malformed(format!("`{}` lacks the `{key}` attribute", element.name()))
    })
}

fn parse<T: FromStr>(element: &Element, key: &str, value: &str) -> Result<T, Error> {
    value.parse().map_err(|_| {
        Error::Malformed(format!(
            "`{}` has an invalid `{key}` attribute: `{value}`",
            element.name()
        ))
    })
}

fn number<T: FromStr>(element: &Element, key: &str) -> Result<T, Error> {
    parse(element, key, required(element, key)?)
}

fn optional_number<T: FromStr>(element: &Element, key: &str) -> Result<Option<T>, Error> {
    element
        .attribute(key)
        .map(|value| parse(element, key, value))
        .transpose()
}

fn numbers(element: &Element, key: &str) -> Result<Vec<f32>, Error> {
    required(element, key)?
        .split_whitespace()
        .map(|value| parse(element, key, value))
        .collect()
}

fn area(element: &Element, key: &str) -> Result<Area, Error> {
    let values: [f32; 4] = numbers(element, key)?
        .try_into()
        .map_err(|_| Error::Malformed(format!("`{key}` needs four values")))?;
    Ok(Area::from_values(values))
}

fn position(element: &Element) -> Result<Option<Point>, Error> {
    let x: Option<f32> = optional_number(element, "x")?;
    let y: Option<f32> = optional_number(element, "y")?;
    Ok(x.zip(y).map(|(x, y)| Point::new(x, y)))
}

fn atoms(element: &Element) -> Result<Vec<String>, Error> {
    element
        .children_named("atom")
        .map(|atom| required(atom, "v").map(str::to_string))
        .collect()
}

fn read_patch(root: &Element) -> Result<Patch, Error> {
    if root.name() != "patch" {
        return Err(Error::Malformed(format!(
            "expected a `patch` element, found `{}`",
            root.name()
        )));
    }
    let top = root
        .child("canvas")
        .ok_or_else(|| Error::Malformed("the patch has no canvas".to_string()))?;

    let font = optional_number(top, "font")?.unwrap_or(Patch::DEFAULT_FONT);
    let mut canvas = Canvas::root(
        required(top, "name")?,
        read_point(top)?,
        read_size(top)?,
        font,
    );
    read_header(&mut canvas, top)?;

    let mut patch = Patch::with_root(required(root, "name")?, canvas)?;
    if let Some(encoding) = root.attribute("encoding") {
        patch.set_encoding(encoding);
    }
    for template in root.children_named("template") {
        patch.add_template(read_template(template)?);
    }
    if let Some(declare) = root.child("declare") {
        patch.merge_dependencies(read_declare(declare)?);
    }

    let mut stack: Vec<(CanvasId, slice::Iter<'_, Element>)> =
        vec![(CanvasId::ROOT, top.children().iter())];
    while let Some((canvas, children)) = stack.last_mut() {
        let canvas = *canvas;
        let Some(child) = children.next() else {
            stack.pop();
            continue;
        };

        if child.attribute("pdpy") == Some("Subpatch") {
            let nested = child
                .child("canvas")
                .ok_or_else(|| Error::Malformed("subpatch without a canvas".to_string()))?;
            let mut sub = Canvas::subpatch_unchecked(
                required(nested, "name")?,
                read_point(nested)?,
                read_size(nested)?,
                required(nested, "visible")? != "0",
            );
            read_header(&mut sub, nested)?;
            let (id, node) =
                patch.add_subpatch_with_id(canvas, number(child, "id")?, sub, position(child)?)?;
            if let Some(node) = canvas_mut(&mut patch, canvas)?.node_mut(node) {
                decorate(node, child)?;
            }
            stack.push((id, nested.children().iter()));
            continue;
        }

        let target = canvas_mut(&mut patch, canvas)?;
        match child.name() {
            _ if child.attribute("pdpy").is_some() => {
                let kind = read_kind(child)?;
                let id = target.add_node_with_id(number(child, "id")?, kind, position(child)?);
                if let Some(node) = target.node_mut(id) {
                    decorate(node, child)?;
                }
            }
            "comment" => {
                let mut comment = Comment::new(position(child)?, atoms(child)?);
                if let Some(border) = optional_number(child, "border")? {
                    comment.set_border(border);
                }
                target.add_comment(comment);
            }
            "connect" => target.connect(Connection::new(
                number(child, "source")?,
                number(child, "outlet")?,
                number(child, "sink")?,
                number(child, "inlet")?,
            )),
            "title" => {}
            other => warn!(element = other; "Skipping unknown canvas element"),
        }
    }
    Ok(patch)
}

fn canvas_mut(patch: &mut Patch, id: CanvasId) -> Result<&mut Canvas, Error> {
    patch
        .canvas_mut(id)
        .ok_or_else(|| Error::Malformed(format!("{id} is not part of the patch")))
}

fn read_point(element: &Element) -> Result<Point, Error> {
    Ok(Point::new(number(element, "x")?, number(element, "y")?))
}

fn read_size(element: &Element) -> Result<Size, Error> {
    Ok(Size::new(number(element, "width")?, number(element, "height")?))
}

/// Coords, border and title of a canvas element.
fn read_header(canvas: &mut Canvas, element: &Element) -> Result<(), Error> {
    if element.attribute("coords").is_some() {
        let values = numbers(element, "coords")?;
        let coords = Coords::from_values(&values)
            .ok_or_else(|| Error::Malformed(format!("{} coords values", values.len())))?;
        canvas.set_coords(coords);
    }
    if let Some(border) = optional_number(element, "border")? {
        canvas.set_border(border);
    }
    if let Some(title) = element.child("title") {
        canvas.set_title(atoms(title)?);
    }
    Ok(())
}

fn read_template(element: &Element) -> Result<StructTemplate, Error> {
    let fields = element
        .children_named("field")
        .map(|field| -> Result<StructField, Error> {
            let kind = match required(field, "type")? {
                "float" => FieldKind::Float,
                "symbol" => FieldKind::Symbol,
                "text" => FieldKind::Text,
                "array" => FieldKind::Array {
                    template: required(field, "template")?.to_string(),
                },
                other => return Err(Error::Malformed(format!("unknown field type `{other}`"))),
            };
            Ok(StructField::new(required(field, "name")?, kind))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(StructTemplate::new(required(element, "name")?, fields))
}

fn read_declare(element: &Element) -> Result<Dependencies, Error> {
    let mut dependencies = Dependencies::default();
    for path in element.children_named("path") {
        dependencies.add_path(required(path, "v")?);
    }
    for lib in element.children_named("lib") {
        dependencies.add_lib(required(lib, "v")?);
    }
    Ok(dependencies)
}

/// Border and payloads shared by every node element.
fn decorate(node: &mut Node, element: &Element) -> Result<(), Error> {
    if let Some(border) = optional_number(element, "border")? {
        node.set_border(border);
    }
    for child in element.children() {
        if let Some(payload) = read_payload(child)? {
            node.push_payload(payload);
        }
    }
    Ok(())
}

/// Build the node variant named by the `pdpy` attribute.
fn read_kind(element: &Element) -> Result<NodeKind, Error> {
    let kind = match NodeKind::empty(required(element, "pdpy")?)? {
        NodeKind::Object(_) => {
            NodeKind::Object(Object::new(required(element, "class")?, atoms(element)?))
        }
        NodeKind::Message(_) => {
            let targets = element
                .children_named("target")
                .map(|target| -> Result<MessageTarget, Error> {
                    let messages = target
                        .children_named("message")
                        .map(atoms)
                        .collect::<Result<Vec<_>, _>>()?;
                    let address = target.attribute("address").map(str::to_string);
                    Ok(MessageTarget::new(address, messages))
                })
                .collect::<Result<Vec<_>, Error>>()?;
            NodeKind::Message(Message::new(targets))
        }
        NodeKind::Widget(_) => {
            let class = required(element, "class")?;
            let widget = Widget::new(class, atoms(element)?)
                .ok_or_else(|| Error::Malformed(format!("`{class}` is not a widget class")))?;
            NodeKind::Widget(widget)
        }
        NodeKind::DataBlock(_) => {
            let name = required(element, "kind")?;
            let kind = DataBlockKind::from_class(name)
                .ok_or_else(|| Error::Malformed(format!("`{name}` is not a data block kind")))?;
            NodeKind::DataBlock(DataBlock::new(kind, atoms(element)?))
        }
        NodeKind::Scalar(_) => {
            let data = element.child("data").map(read_data).transpose()?;
            NodeKind::Scalar(ScalarInstance::new(required(element, "template")?, data))
        }
        NodeKind::Graph(_) => {
            let mut graph = Graph::new(
                required(element, "name")?,
                area(element, "range")?,
                area(element, "area")?,
            );
            for child in element.children_named("array") {
                let mut array = GraphArray::new(
                    required(child, "name")?,
                    number(child, "length")?,
                    required(child, "element")?,
                );
                for payload in child.children() {
                    if let Some(payload) = read_payload(payload)? {
                        array.push_payload(payload);
                    }
                }
                graph.add_array(array);
            }
            NodeKind::Graph(graph)
        }
        NodeKind::GopArray(_) => NodeKind::GopArray(GopArray::new(
            required(element, "name")?,
            number(element, "length")?,
            required(element, "element")?,
            number(element, "flags")?,
        )),
        NodeKind::Subpatch(_) => {
            return Err(Error::Malformed("subpatch outside a canvas".to_string()));
        }
    };
    Ok(kind)
}

fn read_data(element: &Element) -> Result<ScalarData, Error> {
    let mut floats = Vec::new();
    let mut symbols = Vec::new();
    let mut arrays = Vec::new();
    for child in element.children() {
        match child.name() {
            "float" => floats.push(Binding::new(
                required(child, "name")?,
                number::<f32>(child, "value")?,
            )),
            "symbol" => symbols.push(Binding::new(
                required(child, "name")?,
                required(child, "value")?.to_string(),
            )),
            "array" => {
                let elements = child
                    .children_named("element")
                    .map(read_data)
                    .collect::<Result<Vec<_>, _>>()?;
                arrays.push(ArrayBinding::new(
                    required(child, "name")?,
                    required(child, "template")?,
                    elements,
                ));
            }
            other => warn!(element = other; "Skipping unknown scalar data element"),
        }
    }
    Ok(ScalarData::new(floats, symbols, arrays))
}

/// Read a payload element, `None` when `element` is not one.
fn read_payload(element: &Element) -> Result<Option<Payload>, Error> {
    let payload = match element.name() {
        "floats" => Payload::Floats {
            offset: number(element, "offset")?,
            values: numbers(element, "values")?,
        },
        "saved" => Payload::Saved {
            atoms: atoms(element)?,
        },
        "set" => Payload::Set {
            rows: element
                .children_named("row")
                .map(atoms)
                .collect::<Result<Vec<_>, _>>()?,
        },
        _ => return Ok(None),
    };
    Ok(Some(payload))
}
