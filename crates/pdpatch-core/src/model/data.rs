//! Raw data attached to nodes (`#A` statements) and the data-holding
//! objects (`text`, `array`, `scalar` and `file`).

use serde::{Deserialize, Serialize};

/// The payload of one `#A` statement.
///
/// The header atom selects the encoding: a number is the start index of an
/// array chunk of floats, `saved` carries plain atoms and `set` carries
/// rows separated by escaped semicolons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "header", rename_all = "lowercase")]
pub enum Payload {
    /// Array values starting at `offset`.
    Floats { offset: usize, values: Vec<f32> },
    /// Saved state of an object, as unescaped atoms.
    Saved { atoms: Vec<String> },
    /// Rows of unescaped atoms.
    Set { rows: Vec<Vec<String>> },
}

impl Payload {
    /// The header atom written in front of the payload.
    pub fn header(&self) -> String {
        match self {
            Payload::Floats { offset, .. } => offset.to_string(),
            Payload::Saved { .. } => "saved".to_string(),
            Payload::Set { .. } => "set".to_string(),
        }
    }
}

/// The data-holding object families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBlockKind {
    Text,
    Array,
    Scalar,
    File,
}

impl DataBlockKind {
    /// Look up the family for an object class name.
    pub fn from_class(class: &str) -> Option<Self> {
        match class {
            "text" => Some(Self::Text),
            "array" => Some(Self::Array),
            "scalar" => Some(Self::Scalar),
            "file" => Some(Self::File),
            _ => None,
        }
    }

    /// The class name written in the patch.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Array => "array",
            Self::Scalar => "scalar",
            Self::File => "file",
        }
    }
}

/// An object of one of the data-holding families, such as
/// `[text define -k notes]` or `[array define table 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBlock {
    kind: DataBlockKind,
    args: Vec<String>,
}

impl DataBlock {
    pub fn new(kind: DataBlockKind, args: Vec<String>) -> Self {
        Self { kind, args }
    }

    pub fn kind(&self) -> DataBlockKind {
        self.kind
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_header() {
        let floats = Payload::Floats {
            offset: 1000,
            values: vec![0.5],
        };
        assert_eq!(floats.header(), "1000");
        assert_eq!(Payload::Saved { atoms: vec![] }.header(), "saved");
        assert_eq!(Payload::Set { rows: vec![] }.header(), "set");
    }

    #[test]
    fn test_data_block_kind() {
        assert_eq!(DataBlockKind::from_class("text"), Some(DataBlockKind::Text));
        assert_eq!(DataBlockKind::from_class("list"), None);
        assert_eq!(DataBlockKind::File.as_str(), "file");
    }
}
