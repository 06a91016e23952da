//! Atom-level codecs of the patch syntax.
//!
//! Every field of a patch statement is an *atom*: a run of characters
//! delimited by unescaped whitespace. Reserved characters inside an atom are
//! protected with a backslash. The lexer keeps these escapes verbatim; the
//! functions here resolve them ([`unescape`]) and reapply them on the way
//! out ([`escape`]), together with the numeric and boolean decoders used by
//! field-specific readers.
//!
//! # Example
//!
//! ```
//! # use pdpatch_core::atom::{escape, unescape};
//! let raw = "\\$1-level 10";
//! assert_eq!(escape(raw), "\\\\\\$1-level\\ 10");
//! assert_eq!(unescape(&escape(raw)), raw);
//! ```

use crate::ModelError;

/// Characters that must be escaped when written back as part of an atom.
const RESERVED: [char; 5] = ['\\', ' ', '$', ',', ';'];

/// Characters that make a patch or canvas name unusable.
const NAME_FORBIDDEN: [char; 8] = [';', '$', '&', '|', ',', '`', '%', '*'];

/// The escaped comma atom, separating messages inside a message box.
pub const ESCAPED_COMMA: &str = "\\,";

/// The escaped semicolon atom, separating message targets and data rows.
pub const ESCAPED_SEMICOLON: &str = "\\;";

/// Escape every reserved character of `text` with a backslash.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Resolve every `\x` sequence of a raw atom to `x`.
///
/// A lone trailing backslash has nothing to protect and is kept as is.
pub fn unescape(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => text.push(escaped),
                None => text.push('\\'),
            }
        } else {
            text.push(c);
        }
    }
    text
}

/// Returns `true` if the atom reads as a number.
pub fn is_number(token: &str) -> bool {
    decode_number(token).is_some()
}

/// Decode a numeric atom: integers, decimals and exponents.
///
/// Color-like atoms (anything containing `#`) and words such as `inf` are
/// never read as numbers.
pub fn decode_number(token: &str) -> Option<f32> {
    if token.contains('#') {
        return None;
    }
    let first = token.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '-' | '+' | '.')) {
        return None;
    }
    token.parse::<f32>().ok().filter(|value| value.is_finite())
}

/// Decode a boolean atom spelled `0`/`1` or `true`/`false`.
///
/// Any other number reads as `true` when non-zero.
pub fn decode_bool(token: &str) -> Option<bool> {
    match token {
        "true" => Some(true),
        "false" => Some(false),
        _ => decode_number(token).map(|value| value != 0.0),
    }
}

/// Format a number the way the patch syntax writes it: integral values have
/// no fractional part.
pub fn format_number(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1.0e9 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Check that a patch or canvas name carries none of the structural
/// characters of the patch syntax.
///
/// # Errors
///
/// Returns [`ModelError::MalformedName`] naming the first offending character.
pub fn check_name(name: &str) -> Result<(), ModelError> {
    match name.chars().find(|c| NAME_FORBIDDEN.contains(c)) {
        Some(found) => Err(ModelError::MalformedName {
            name: name.to_string(),
            found,
        }),
        None => Ok(()),
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Strategy for strings rich in reserved characters.
    fn reserved_text_strategy() -> impl Strategy<Value = String> {
        "[a-z0-9 $,;\\\\]{0,40}"
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Unescaping an escaped string gives back the original.
    fn check_escape_symmetry(text: &str) -> Result<(), TestCaseError> {
        prop_assert_eq!(unescape(&escape(text)), text);
        Ok(())
    }

    /// An escaped string never contains an unprotected space.
    fn check_escape_protects_spaces(text: &str) -> Result<(), TestCaseError> {
        let escaped = escape(text);
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                chars.next();
                continue;
            }
            prop_assert_ne!(c, ' ');
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn escape_symmetry(text in reserved_text_strategy()) {
            check_escape_symmetry(&text)?;
        }

        #[test]
        fn escape_protects_spaces(text in reserved_text_strategy()) {
            check_escape_protects_spaces(&text)?;
        }
    }
}
