//! Lexed statements and the helpers that slice their fields.

use pdpatch_core::atom::{ESCAPED_SEMICOLON, decode_number};

use crate::span::Span;

/// The field that separates a statement from its decoration.
pub const DECORATION_SEPARATOR: &str = ",";

/// One `;`-terminated statement of a patch source, e.g.
/// `#X obj 10 10 osc~ 440`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    fields: Vec<String>,
    span: Span,
    terminated: bool,
}

impl Statement {
    pub fn new(fields: Vec<String>, span: Span, terminated: bool) -> Self {
        Self {
            fields,
            span,
            terminated,
        }
    }

    /// Every field, decoration included, escapes intact.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Source span from the first field to the terminator.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Returns `false` for a final statement missing its `;`.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// The record kind and keyword, e.g. `("#X", "obj")`.
    ///
    /// A statement with a single field has an empty keyword.
    pub fn head(&self) -> (&str, &str) {
        let kind = self.fields.first().map_or("", String::as_str);
        let keyword = self.fields.get(1).map_or("", String::as_str);
        (kind, keyword)
    }

    /// Split the fields at the first bare comma into the body and the
    /// decoration that follows it.
    ///
    /// ```
    /// # use pdpatch_parser::tokenize;
    /// # use pdpatch_parser::statement::Statement;
    /// # use pdpatch_parser::Span;
    /// let statement = Statement::new(tokenize("#X obj 10 10 t b b, f 8"), Span::default(), true);
    /// let (body, decoration) = statement.split_decoration();
    /// assert_eq!(body.len(), 7);
    /// assert_eq!(decoration.unwrap(), ["f", "8"]);
    /// ```
    pub fn split_decoration(&self) -> (&[String], Option<&[String]>) {
        match self
            .fields
            .iter()
            .position(|field| field == DECORATION_SEPARATOR)
        {
            Some(index) => (&self.fields[..index], Some(&self.fields[index + 1..])),
            None => (&self.fields, None),
        }
    }

    /// The arguments after the head, decoration excluded.
    pub fn args(&self) -> &[String] {
        let (body, _) = self.split_decoration();
        body.get(2..).unwrap_or_default()
    }

    /// The border width of an `f <n>` decoration.
    pub fn border(&self) -> Option<u32> {
        match self.split_decoration() {
            (_, Some([f, width])) if f == "f" => decode_border(width),
            _ => None,
        }
    }
}

/// Decode a border width: a non-negative integral number.
pub fn decode_border(field: &str) -> Option<u32> {
    decode_number(field)
        .filter(|width| *width >= 0.0 && width.fract() == 0.0)
        .map(|width| width as u32)
}

/// Split fields on escaped semicolons.
///
/// A trailing empty segment, left by a final separator, is dropped; empty
/// segments elsewhere are kept since they terminate arrays.
pub fn segments(fields: &[String]) -> Vec<&[String]> {
    let mut segments: Vec<&[String]> = fields
        .split(|field| field == ESCAPED_SEMICOLON)
        .collect();
    if segments.last().is_some_and(|segment| segment.is_empty()) {
        segments.pop();
    }
    segments
}
