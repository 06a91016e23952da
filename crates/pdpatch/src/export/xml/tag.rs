//! Element names for object classes.
//!
//! Object classes become element names, so operator classes such as `+` or
//! `>>` are spelled out and a trailing `~` becomes `_tilde`. Anything that
//! still is not a valid element name falls back to `obj`; the class itself
//! is always kept in the `class` attribute.

/// Element name used when a class cannot be spelled as one.
pub const FALLBACK: &str = "obj";

const OPERATORS: [(&str, &str); 18] = [
    ("%", "op_mod"),
    ("*", "op_mul"),
    ("-", "op_minus"),
    ("+", "op_plus"),
    ("/", "op_div"),
    ("==", "op_eq"),
    ("!=", "op_ne"),
    (">", "op_gt"),
    ("<", "op_lt"),
    (">=", "op_ge"),
    ("<=", "op_le"),
    ("||", "op_or"),
    ("&&", "op_and"),
    ("!", "op_not"),
    ("&", "binop_and"),
    ("|", "binop_bor"),
    (">>", "binop_ls"),
    ("<<", "binop_rs"),
];

/// The element name for an object class.
///
/// ```
/// # use pdpatch::export::xml::tag::mangle;
/// assert_eq!(mangle("osc~"), "osc_tilde");
/// assert_eq!(mangle("*~"), "op_mul_tilde");
/// assert_eq!(mangle("1/x"), "obj");
/// ```
pub fn mangle(class: &str) -> String {
    let (stem, tilde) = match class.strip_suffix('~') {
        Some(stem) => (stem, "_tilde"),
        None => (class, ""),
    };
    let stem = OPERATORS
        .iter()
        .find(|(operator, _)| *operator == stem)
        .map_or(stem, |(_, name)| *name);

    let name = format!("{stem}{tilde}");
    if is_element_name(&name) {
        name
    } else {
        FALLBACK.to_string()
    }
}

/// Returns `true` when `name` can be written as an element name.
pub fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_are_spelled_out() {
        assert_eq!(mangle("+"), "op_plus");
        assert_eq!(mangle(">="), "op_ge");
        assert_eq!(mangle("<<"), "binop_rs");
        assert_eq!(mangle("&&"), "op_and");
        assert_eq!(mangle("/~"), "op_div_tilde");
    }

    #[test]
    fn test_plain_classes_are_kept() {
        assert_eq!(mangle("metro"), "metro");
        assert_eq!(mangle("list-drip"), "list-drip");
        assert_eq!(mangle("dac~"), "dac_tilde");
    }

    #[test]
    fn test_invalid_names_fall_back() {
        assert_eq!(mangle(""), FALLBACK);
        assert_eq!(mangle("~"), "_tilde");
        assert_eq!(mangle("0x"), FALLBACK);
        assert_eq!(mangle("a b"), FALLBACK);
        assert_eq!(mangle("$0-foo"), FALLBACK);
    }
}
