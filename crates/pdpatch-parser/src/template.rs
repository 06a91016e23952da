//! Filling scalar data from raw statement segments.
//!
//! A scalar is written as its flat values followed by the elements of each
//! array field:
//!
//! ```text
//! #X scalar path 10 20 blue \; 0 0 \; 5 8 \; \;;
//!                ^^^^^^^^^^ floats, then symbols
//!                              ^^^^^^^^^^^^ elements of the first array
//!                                          ^^ array terminator
//! ```
//!
//! The segments are the runs of fields between escaped semicolons.

use log::{debug, warn};

use pdpatch_core::{
    atom::{decode_number, unescape},
    model::{ArrayBinding, Binding, FieldKind, ScalarData, StructTemplate},
};

/// Fill a record of `template` from raw segments.
///
/// The first segment binds floats then symbols by position; missing
/// trailing values stay unbound and extra values are ignored. Each array
/// field then takes the following segments up to an empty one, filling
/// every element from the template named by the field. Templates are
/// looked up in `templates`.
///
/// Returns `None` when there are no segments at all.
pub fn fill(
    template: &StructTemplate,
    segments: &[&[String]],
    templates: &[StructTemplate],
) -> Option<ScalarData> {
    let (head, rest) = segments.split_first()?;

    let mut values = head.iter();
    let floats: Vec<Binding<f32>> = template
        .float_fields()
        .zip(values.by_ref())
        .map(|(field, raw)| {
            let value = decode_number(raw).unwrap_or_else(|| {
                warn!(
                    template = template.name(),
                    field = field.name(),
                    raw = raw.as_str();
                    "Non-numeric value for float field, using 0"
                );
                0.0
            });
            Binding::new(field.name(), value)
        })
        .collect();
    let symbols: Vec<Binding<String>> = template
        .symbol_fields()
        .zip(values.by_ref())
        .map(|(field, raw)| Binding::new(field.name(), unescape(raw)))
        .collect();
    let leftover = values.count();
    if leftover > 0 {
        debug!(template = template.name(), leftover; "Ignoring extra scalar values");
    }

    let mut cursor = rest.iter();
    let mut arrays = Vec::new();
    for field in template.array_fields() {
        let FieldKind::Array {
            template: element_name,
        } = field.kind()
        else {
            continue;
        };
        let element_template = templates.iter().find(|t| t.name() == element_name);
        if element_template.is_none() {
            warn!(
                template = template.name(),
                field = field.name(),
                element = element_name.as_str();
                "Array element template is not defined, leaving the array empty"
            );
        }

        let mut elements = Vec::new();
        for segment in cursor.by_ref() {
            if segment.is_empty() {
                break;
            }
            if let Some(element_template) = element_template {
                // element segments carry only flat values
                if let Some(element) = fill(element_template, &[*segment], templates) {
                    elements.push(element);
                }
            }
        }
        arrays.push(ArrayBinding::new(field.name(), element_name.as_str(), elements));
    }

    Some(ScalarData::new(floats, symbols, arrays))
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use pdpatch_core::model::StructField;

    use super::*;
    use crate::{lexer::tokenize, statement::segments};

    fn template(name: &str, fields: &[(&str, FieldKind)]) -> StructTemplate {
        StructTemplate::new(
            name,
            fields
                .iter()
                .map(|(field, kind)| StructField::new(*field, kind.clone()))
                .collect(),
        )
    }

    fn fill_line(
        template: &StructTemplate,
        line: &str,
        templates: &[StructTemplate],
    ) -> Option<ScalarData> {
        let fields = tokenize(line);
        fill(template, &segments(&fields), templates)
    }

    #[test]
    fn test_fill_two_floats() {
        let t = template("T", &[("a", FieldKind::Float), ("b", FieldKind::Float)]);
        let data = fill_line(&t, "1 2", &[]).unwrap();

        assert_approx_eq!(f32, data.float("a").unwrap(), 1.0);
        assert_approx_eq!(f32, data.float("b").unwrap(), 2.0);
        assert!(data.symbols().is_empty());
    }

    #[test]
    fn test_fill_floats_then_symbols() {
        let t = template(
            "T",
            &[
                ("label", FieldKind::Symbol),
                ("x", FieldKind::Float),
                ("y", FieldKind::Float),
            ],
        );
        let data = fill_line(&t, r"3 4 hello\ world", &[]).unwrap();

        assert_eq!(data.floats().len(), 2);
        assert_approx_eq!(f32, data.float("y").unwrap(), 4.0);
        assert_eq!(data.symbol("label"), Some("hello world"));
    }

    #[test]
    fn test_fill_short_payload_leaves_fields_unbound() {
        let t = template(
            "T",
            &[
                ("a", FieldKind::Float),
                ("b", FieldKind::Float),
                ("s", FieldKind::Symbol),
            ],
        );
        let data = fill_line(&t, "7", &[]).unwrap();

        assert_eq!(data.floats().len(), 1);
        assert!(data.float("b").is_none());
        assert!(data.symbols().is_empty());
    }

    #[test]
    fn test_fill_without_segments() {
        let t = template("T", &[("a", FieldKind::Float)]);
        assert!(fill(&t, &[], &[]).is_none());
    }

    #[test]
    fn test_fill_array_of_structs() {
        let element = template("pt", &[("x", FieldKind::Float), ("y", FieldKind::Float)]);
        let path = template(
            "path",
            &[
                ("x", FieldKind::Float),
                (
                    "points",
                    FieldKind::Array {
                        template: "pt".to_string(),
                    },
                ),
                (
                    "more",
                    FieldKind::Array {
                        template: "pt".to_string(),
                    },
                ),
            ],
        );
        let templates = [element, path.clone()];

        let data = fill_line(&path, r"10 \; 0 0 \; 5 8 \; \; 1 1 \; \;", &templates).unwrap();

        let points = data.array("points").unwrap();
        assert_eq!(points.template(), "pt");
        assert_eq!(points.elements().len(), 2);
        assert_approx_eq!(f32, points.elements()[1].float("y").unwrap(), 8.0);

        let more = data.array("more").unwrap();
        assert_eq!(more.elements().len(), 1);
    }

    #[test]
    fn test_fill_missing_element_template() {
        let t = template(
            "T",
            &[(
                "items",
                FieldKind::Array {
                    template: "ghost".to_string(),
                },
            )],
        );
        let data = fill_line(&t, r"\; 1 2 \; \;", &[]).unwrap();

        let items = data.array("items").unwrap();
        assert!(items.elements().is_empty());
    }
}
