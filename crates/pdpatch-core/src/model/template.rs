//! Data structure templates and the scalars that instantiate them.

use serde::{Deserialize, Serialize};

use crate::atom::format_number;

/// The type of one template field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Float,
    Symbol,
    Text,
    /// An array whose elements follow the named template.
    Array { template: String },
}

impl FieldKind {
    /// The type keyword written in a struct statement.
    pub fn keyword(&self) -> &'static str {
        match self {
            FieldKind::Float => "float",
            FieldKind::Symbol => "symbol",
            FieldKind::Text => "text",
            FieldKind::Array { .. } => "array",
        }
    }
}

/// A named, typed field of a [`StructTemplate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    name: String,
    #[serde(flatten)]
    kind: FieldKind,
}

impl StructField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

/// A user-defined record type (`#N struct name type field ...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructTemplate {
    name: String,
    fields: Vec<StructField>,
}

impl StructTemplate {
    pub fn new(name: impl Into<String>, fields: Vec<StructField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    /// Float fields in declaration order.
    pub fn float_fields(&self) -> impl Iterator<Item = &StructField> {
        self.fields
            .iter()
            .filter(|field| matches!(field.kind, FieldKind::Float))
    }

    /// Symbol fields in declaration order. Text fields are filled like
    /// symbols.
    pub fn symbol_fields(&self) -> impl Iterator<Item = &StructField> {
        self.fields
            .iter()
            .filter(|field| matches!(field.kind, FieldKind::Symbol | FieldKind::Text))
    }

    /// Array fields in declaration order.
    pub fn array_fields(&self) -> impl Iterator<Item = &StructField> {
        self.fields
            .iter()
            .filter(|field| matches!(field.kind, FieldKind::Array { .. }))
    }
}

/// A value bound to a named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding<T> {
    name: String,
    value: T,
}

impl<T> Binding<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

/// The elements bound to one array field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayBinding {
    name: String,
    template: String,
    elements: Vec<ScalarData>,
}

impl ArrayBinding {
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        elements: Vec<ScalarData>,
    ) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            elements,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the element template.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn elements(&self) -> &[ScalarData] {
        &self.elements
    }
}

/// Field values of one record. Fields without a value are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarData {
    #[serde(default)]
    floats: Vec<Binding<f32>>,
    #[serde(default)]
    symbols: Vec<Binding<String>>,
    #[serde(default)]
    arrays: Vec<ArrayBinding>,
}

impl ScalarData {
    pub fn new(
        floats: Vec<Binding<f32>>,
        symbols: Vec<Binding<String>>,
        arrays: Vec<ArrayBinding>,
    ) -> Self {
        Self {
            floats,
            symbols,
            arrays,
        }
    }

    pub fn floats(&self) -> &[Binding<f32>] {
        &self.floats
    }

    pub fn symbols(&self) -> &[Binding<String>] {
        &self.symbols
    }

    pub fn arrays(&self) -> &[ArrayBinding] {
        &self.arrays
    }

    /// Look up a float by field name.
    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats
            .iter()
            .find(|binding| binding.name == name)
            .map(|binding| binding.value)
    }

    /// Look up a symbol by field name.
    pub fn symbol(&self, name: &str) -> Option<&str> {
        self.symbols
            .iter()
            .find(|binding| binding.name == name)
            .map(|binding| binding.value.as_str())
    }

    /// Look up an array by field name.
    pub fn array(&self, name: &str) -> Option<&ArrayBinding> {
        self.arrays.iter().find(|binding| binding.name == name)
    }

    /// The flat values of the record, floats first, as unescaped atoms.
    pub fn atoms(&self) -> Vec<String> {
        self.floats
            .iter()
            .map(|binding| format_number(binding.value))
            .chain(self.symbols.iter().map(|binding| binding.value.clone()))
            .collect()
    }
}

/// A scalar node: a template name paired with its filled data.
///
/// `data` is `None` when the statement carried no data at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarInstance {
    template: String,
    #[serde(default)]
    data: Option<ScalarData>,
}

impl ScalarInstance {
    pub fn new(template: impl Into<String>, data: Option<ScalarData>) -> Self {
        Self {
            template: template.into(),
            data,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn data(&self) -> Option<&ScalarData> {
        self.data.as_ref()
    }
}
