//! pdpatch - Read, arrange and write Pure Data patches.
//!
//! Patches are parsed from their native text, optionally given positions by
//! the auto-arranger, and written back as patch text, JSON or XML. The JSON
//! and XML documents can be read back into the same model.

pub mod config;
pub mod export;
pub mod layout;

mod error;

pub use pdpatch_core::{atom, geometry, model};

pub use error::PdPatchError;

use std::{fmt, path::Path};

use encoding_rs::Encoding;
use log::{debug, info, trace, warn};

use pdpatch_core::model::Patch;

use config::AppConfig;
use export::{
    Exporter, Importer,
    json::{JsonExporter, JsonImporter},
    pd::PdExporter,
    xml::{XmlExporter, XmlImporter},
};
use layout::Arranger;

/// The document formats a patch can be read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Native patch text.
    Pd,
    Json,
    Xml,
}

impl Format {
    /// Pick a format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`PdPatchError::UnsupportedFormat`] for any extension other
    /// than `pd`, `json` or `xml`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pdpatch::Format;
    /// assert_eq!(Format::from_path("synth.pd").unwrap(), Format::Pd);
    /// assert_eq!(Format::from_path("out/synth.JSON").unwrap(), Format::Json);
    /// assert!(Format::from_path("synth.txt").is_err());
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PdPatchError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("pd") => Ok(Self::Pd),
            Some("json") => Ok(Self::Json),
            Some("xml") => Ok(Self::Xml),
            _ => Err(PdPatchError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pd => write!(f, "pd"),
            Self::Json => write!(f, "json"),
            Self::Xml => write!(f, "xml"),
        }
    }
}

/// Builder for reading, arranging and writing patches.
///
/// # Examples
///
/// ```
/// use pdpatch::{PatchBuilder, config::AppConfig};
///
/// let source = "#N canvas 0 50 450 300 12;\r\n\
///               #X obj 0 0 loadbang;\r\n\
///               #X obj 0 0 print;\r\n\
///               #X connect 0 0 1 0;\r\n";
///
/// let builder = PatchBuilder::new(AppConfig::default());
/// let patch = builder.parse(source, "hello").expect("Failed to parse");
///
/// let json = builder.to_json(&patch).expect("Failed to write JSON");
/// let restored = builder.read_json(&json).expect("Failed to read JSON");
/// assert_eq!(builder.to_pd(&restored).unwrap(), source);
/// ```
#[derive(Debug, Default)]
pub struct PatchBuilder {
    config: AppConfig,
}

impl PatchBuilder {
    /// Create a builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Decode document bytes with the configured encoding.
    ///
    /// A byte order mark takes precedence over the configured label. Bytes
    /// the encoding cannot map become U+FFFD and are logged.
    ///
    /// # Errors
    ///
    /// Returns [`PdPatchError::Encoding`] when the configured label names no
    /// known encoding.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdpatch::{PatchBuilder, config::AppConfig};
    ///
    /// let builder = PatchBuilder::new(AppConfig::default().with_encoding("iso-8859-1"));
    /// assert_eq!(builder.decode(b"caf\xe9").unwrap(), "café");
    /// ```
    pub fn decode(&self, bytes: &[u8]) -> Result<String, PdPatchError> {
        let encoding = lookup(self.config.output().encoding())?;
        let (text, actual, had_errors) = encoding.decode(bytes);
        if had_errors {
            warn!(encoding = actual.name(); "Input holds bytes outside its encoding");
        }
        debug!(encoding = actual.name(), bytes = bytes.len(); "Input decoded");
        Ok(text.into_owned())
    }

    /// Encode written text with the encoding the patch declares, so that
    /// the bytes agree with the XML declaration.
    ///
    /// # Errors
    ///
    /// Returns [`PdPatchError::Encoding`] when the label names no known
    /// encoding or the text holds characters the encoding cannot represent.
    pub fn encode(&self, patch: &Patch, text: &str) -> Result<Vec<u8>, PdPatchError> {
        let encoding = lookup(patch.encoding())?;
        let (bytes, actual, had_errors) = encoding.encode(text);
        if had_errors {
            return Err(PdPatchError::Encoding(format!(
                "the document holds characters {} cannot represent",
                actual.name()
            )));
        }
        debug!(encoding = actual.name(), bytes = bytes.len(); "Output encoded");
        Ok(bytes.into_owned())
    }

    /// Parse patch text into a [`Patch`] named `name`.
    ///
    /// The patch records the encoding of the output configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PdPatchError::Parse`], carrying the source text, when the
    /// text has no root canvas, unbalanced nesting or a malformed name.
    pub fn parse(&self, source: &str, name: &str) -> Result<Patch, PdPatchError> {
        info!(name; "Parsing patch");
        let mut patch = pdpatch_parser::parse(source, name)
            .map_err(|err| PdPatchError::new_parse_error(err, source))?;
        patch.set_encoding(self.config.output().encoding());

        debug!(canvases = patch.canvas_count(); "Patch parsed successfully");
        trace!(patch:?; "Parsed patch");
        Ok(patch)
    }

    /// Read a JSON document written by [`PatchBuilder::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`PdPatchError::Json`] for malformed JSON and
    /// [`PdPatchError::Model`] when the document names an unknown node type
    /// or a malformed patch name.
    pub fn read_json(&self, text: &str) -> Result<Patch, PdPatchError> {
        info!("Reading JSON document");
        Ok(JsonImporter.import(text)?)
    }

    /// Read an XML document written by [`PatchBuilder::to_xml`].
    ///
    /// # Errors
    ///
    /// Returns [`PdPatchError::Xml`] for malformed XML,
    /// [`PdPatchError::Document`] for a missing or invalid attribute and
    /// [`PdPatchError::Model`] for an unknown node type.
    pub fn read_xml(&self, text: &str) -> Result<Patch, PdPatchError> {
        info!("Reading XML document");
        Ok(XmlImporter.import(text)?)
    }

    /// Read a document of any format. `name` is used for patch text only;
    /// structured documents carry their own name.
    ///
    /// # Errors
    ///
    /// See [`PatchBuilder::parse`], [`PatchBuilder::read_json`] and
    /// [`PatchBuilder::read_xml`].
    pub fn read(&self, text: &str, name: &str, format: Format) -> Result<Patch, PdPatchError> {
        match format {
            Format::Pd => self.parse(text, name),
            Format::Json => self.read_json(text),
            Format::Xml => self.read_xml(text),
        }
    }

    /// Give every unplaced node a position.
    ///
    /// Returns the number of nodes that were placed.
    ///
    /// # Errors
    ///
    /// Returns [`PdPatchError::Config`] when a step is not a positive
    /// number.
    pub fn arrange(&self, patch: &mut Patch) -> Result<usize, PdPatchError> {
        let config = self.config.arrange();
        for (name, step) in [("hstep", config.hstep()), ("vstep", config.vstep())] {
            if !step.is_finite() || step <= 0.0 {
                return Err(PdPatchError::Config(format!(
                    "`{name}` must be a positive number, got {step}"
                )));
            }
        }

        info!(force = config.force(); "Arranging patch");
        let placed = Arranger::new(config).arrange(patch);
        info!(placed; "Patch arranged");
        Ok(placed)
    }

    /// Write native patch text.
    ///
    /// # Errors
    ///
    /// Writing patch text does not fail today; the `Result` keeps the
    /// writers interchangeable.
    pub fn to_pd(&self, patch: &Patch) -> Result<String, PdPatchError> {
        info!("Writing patch text");
        Ok(PdExporter.export(patch)?)
    }

    /// Write an indented JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`PdPatchError::Json`] when serialization fails.
    pub fn to_json(&self, patch: &Patch) -> Result<String, PdPatchError> {
        info!("Writing JSON document");
        Ok(JsonExporter::pretty().export(patch)?)
    }

    /// Write an XML document declaring the patch encoding.
    ///
    /// # Errors
    ///
    /// Returns [`PdPatchError::Xml`] or [`PdPatchError::Io`] when an
    /// element cannot be written.
    pub fn to_xml(&self, patch: &Patch) -> Result<String, PdPatchError> {
        info!("Writing XML document");
        Ok(XmlExporter.export(patch)?)
    }

    /// Write a document of any format.
    ///
    /// # Errors
    ///
    /// See [`PatchBuilder::to_pd`], [`PatchBuilder::to_json`] and
    /// [`PatchBuilder::to_xml`].
    pub fn write(&self, patch: &Patch, format: Format) -> Result<String, PdPatchError> {
        match format {
            Format::Pd => self.to_pd(patch),
            Format::Json => self.to_json(patch),
            Format::Xml => self.to_xml(patch),
        }
    }
}

/// Resolve a WHATWG label, retrying without separators so that spellings
/// such as `latin-1` or `utf_8` resolve too.
fn lookup(label: &str) -> Result<&'static Encoding, PdPatchError> {
    let compact: String = label.chars().filter(|c| !matches!(c, '-' | '_')).collect();
    Encoding::for_label(label.as_bytes())
        .or_else(|| Encoding::for_label(compact.as_bytes()))
        .ok_or_else(|| PdPatchError::Encoding(format!("unknown encoding `{label}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArrangeConfig, OutputConfig};

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path("a/b/c.xml").unwrap(), Format::Xml);
        assert!(matches!(
            Format::from_path("noext"),
            Err(PdPatchError::UnsupportedFormat(_))
        ));
        assert_eq!(Format::Json.to_string(), "json");
    }

    #[test]
    fn test_parse_records_configured_encoding() {
        let output: OutputConfig = serde_json::from_str(r#"{"encoding": "iso-8859-1"}"#).unwrap();
        let builder = PatchBuilder::new(AppConfig::new(ArrangeConfig::default(), output));

        let patch = builder.parse("#N canvas 0 50 450 300 12;", "x").unwrap();
        assert_eq!(patch.encoding(), "iso-8859-1");
        assert!(builder.to_xml(&patch).unwrap().contains("encoding=\"iso-8859-1\""));
    }

    #[test]
    fn test_bytes_follow_configured_encoding() {
        let builder = PatchBuilder::new(AppConfig::default().with_encoding("iso-8859-1"));
        let source = builder
            .decode(b"#N canvas 0 50 450 300 12;\r\n#X text 0 0 caf\xe9;\r\n")
            .unwrap();
        assert!(source.contains("café"));

        let patch = builder.parse(&source, "x").unwrap();
        let text = builder.to_pd(&patch).unwrap();
        let bytes = builder.encode(&patch, &text).unwrap();
        assert!(bytes.ends_with(b"caf\xe9;\r\n"));

        let xml = builder.to_xml(&patch).unwrap();
        let bytes = builder.encode(&patch, &xml).unwrap();
        assert!(!bytes.windows(2).any(|pair| pair == "é".as_bytes()));
        assert!(bytes.windows(4).any(|window| window == b"caf\xe9"));
    }

    #[test]
    fn test_utf8_is_the_default_encoding() {
        let builder = PatchBuilder::default();
        let source = builder.decode("#X text 0 0 café;".as_bytes()).unwrap();
        assert_eq!(source, "#X text 0 0 café;");
    }

    #[test]
    fn test_separated_labels_resolve() {
        for label in ["latin-1", "LATIN1", "utf_8", "iso-8859-15"] {
            let builder = PatchBuilder::new(AppConfig::default().with_encoding(label));
            assert!(builder.decode(b"abc").is_ok(), "{label}");
        }
        let builder = PatchBuilder::new(AppConfig::default().with_encoding("latin-1"));
        assert_eq!(builder.decode(b"\xe9").unwrap(), "é");
    }

    #[test]
    fn test_unknown_or_unmappable_encoding_is_reported() {
        let builder = PatchBuilder::new(AppConfig::default().with_encoding("klingon"));
        assert!(matches!(builder.decode(b"x"), Err(PdPatchError::Encoding(_))));

        let mut patch = Patch::new("x").unwrap();
        patch.set_encoding("iso-8859-1");
        assert!(matches!(builder.encode(&patch, "\u{263a}"), Err(PdPatchError::Encoding(_))));
        assert_eq!(builder.encode(&patch, "abc").unwrap(), b"abc");
    }

    #[test]
    fn test_parse_error_keeps_source() {
        let source = "#X obj 0 0 f;";
        let Err(PdPatchError::Parse { src, .. }) = PatchBuilder::default().parse(source, "x") else {
            panic!("expected a parse error");
        };
        assert_eq!(src, source);
    }

    #[test]
    fn test_arrange_rejects_invalid_steps() {
        let arrange = ArrangeConfig::default().with_steps(0.0, 1.0);
        let builder = PatchBuilder::new(AppConfig::new(arrange, OutputConfig::default()));
        let mut patch = Patch::new("x").unwrap();

        assert!(matches!(builder.arrange(&mut patch), Err(PdPatchError::Config(_))));
    }
}
