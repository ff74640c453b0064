//! Validation-constraint extraction.
//!
//! Reads the constraint annotations on a property (`IsEmail`, `MinLength(3)`,
//! `#[is_in(["a", "b"])]`, ...) into a [`ConstraintSet`]. Names are compared
//! after normalization, so decorator-style and attribute-style spellings are
//! interchangeable. Unknown annotations are ignored. When the same field is
//! set twice the later annotation wins.

use crate::classifier::normalize_name;
use crate::source::{Annotation, AnnotationArg, PropertyDecl};
use log::debug;
use serde::Serialize;

/// Normalized constraints of one property.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_in: Option<Vec<String>>,
    /// Carries a presence or non-emptiness constraint
    #[serde(skip)]
    pub required: bool,
    /// Carries an explicit optionality constraint
    #[serde(skip)]
    pub optional: bool,
}

impl ConstraintSet {
    pub fn is_empty(&self) -> bool {
        *self == ConstraintSet::default()
    }
}

/// Builds the constraint set for a list of annotations, in order.
pub fn extract_constraints(annotations: &[Annotation]) -> ConstraintSet {
    let mut set = ConstraintSet::default();
    for annotation in annotations {
        apply(&mut set, annotation);
    }
    set
}

fn apply(set: &mut ConstraintSet, annotation: &Annotation) {
    let args = &annotation.args;
    match normalize_name(&annotation.name).as_str() {
        "isstring" => set.type_override = Some("string".to_string()),
        "isint" => set.type_override = Some("integer".to_string()),
        "isnumber" => set.type_override = Some("number".to_string()),
        "isboolean" => set.type_override = Some("boolean".to_string()),
        "isemail" => set.format = Some("email".to_string()),
        "isurl" => set.format = Some("uri".to_string()),
        "isuuid" => set.format = Some("uuid".to_string()),
        "isdate" | "isdatestring" | "isiso8601" => set.format = Some("date-time".to_string()),
        "isnotempty" => {
            set.required = true;
            set.min_length = Some(1);
        }
        "isdefined" => set.required = true,
        "isoptional" => set.optional = true,
        "minlength" => set_if_some(&mut set.min_length, arg_u64(args, 0)),
        "maxlength" => set_if_some(&mut set.max_length, arg_u64(args, 0)),
        "length" => {
            set_if_some(&mut set.min_length, arg_u64(args, 0));
            set_if_some(&mut set.max_length, arg_u64(args, 1));
        }
        "matches" => set_if_some(&mut set.pattern, args.first().map(|a| a.text().to_string())),
        "min" => set_if_some(&mut set.minimum, arg_f64(args, 0)),
        "max" => set_if_some(&mut set.maximum, arg_f64(args, 0)),
        "ispositive" => set.minimum = Some(1.0),
        "arrayminsize" => set_if_some(&mut set.min_items, arg_u64(args, 0)),
        "arraymaxsize" => set_if_some(&mut set.max_items, arg_u64(args, 0)),
        "arraynotempty" => set.min_items = Some(1),
        "isin" | "isenum" => set_if_some(&mut set.enum_values, arg_list(args)),
        "isnotin" => set_if_some(&mut set.not_in, arg_list(args)),
        other => debug!("Ignoring non-constraint annotation: {}", other),
    }
}

fn set_if_some<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn arg_u64(args: &[AnnotationArg], idx: usize) -> Option<u64> {
    args.get(idx)?.text().trim().parse().ok()
}

fn arg_f64(args: &[AnnotationArg], idx: usize) -> Option<f64> {
    args.get(idx)?.text().trim().parse().ok()
}

/// Reads a membership list from `["a", "b"]`-style text, or from several
/// plain arguments.
fn arg_list(args: &[AnnotationArg]) -> Option<Vec<String>> {
    let values: Vec<String> = match args {
        [] => return None,
        [single] => split_list(single.text()),
        many => many.iter().map(|a| unquote(a.text())).collect(),
    };
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn split_list(text: &str) -> Vec<String> {
    let inner = text
        .trim()
        .trim_start_matches(['[', '(', '{'])
        .trim_end_matches([']', ')', '}']);
    inner
        .split(',')
        .map(unquote)
        .filter(|value| !value.is_empty())
        .collect()
}

fn unquote(text: &str) -> String {
    text.trim().trim_matches(['"', '\'']).to_string()
}

/// Whether a property is required in the final schema.
///
/// Explicit optionality always wins. Otherwise a presence constraint makes the
/// property required, as does a declaration that is neither optional nor
/// defaulted.
pub fn is_required(decl: &PropertyDecl, constraints: &ConstraintSet) -> bool {
    if constraints.optional {
        return false;
    }
    constraints.required || (!decl.optional && !decl.has_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TypeExpr;
    use pretty_assertions::assert_eq;

    fn ann(name: &str, args: &[&str]) -> Annotation {
        Annotation::new(
            name,
            args.iter()
                .map(|a| AnnotationArg::Expr {
                    expr: a.to_string(),
                })
                .collect(),
        )
    }

    fn prop(optional: bool, has_default: bool) -> PropertyDecl {
        PropertyDecl {
            name: "field".to_string(),
            ty: TypeExpr::named("string"),
            optional,
            has_default,
            docs: None,
            annotations: vec![],
        }
    }

    #[test]
    fn test_string_bounds_and_format() {
        let set = extract_constraints(&[
            ann("IsEmail", &[]),
            ann("MinLength", &["3"]),
            ann("max_length", &["64"]),
            ann("Matches", &["^[a-z]+$"]),
        ]);

        assert_eq!(set.format.as_deref(), Some("email"));
        assert_eq!(set.min_length, Some(3));
        assert_eq!(set.max_length, Some(64));
        assert_eq!(set.pattern.as_deref(), Some("^[a-z]+$"));
    }

    #[test]
    fn test_later_annotation_wins() {
        let set = extract_constraints(&[
            ann("Length", &["2", "10"]),
            ann("MinLength", &["5"]),
            ann("IsInt", &[]),
            ann("IsNumber", &[]),
        ]);

        assert_eq!(set.min_length, Some(5));
        assert_eq!(set.max_length, Some(10));
        assert_eq!(set.type_override.as_deref(), Some("number"));
    }

    #[test]
    fn test_numeric_and_array_bounds() {
        let set = extract_constraints(&[
            ann("Min", &["0.5"]),
            ann("Max", &["100"]),
            ann("ArrayNotEmpty", &[]),
            ann("ArrayMaxSize", &["10"]),
        ]);

        assert_eq!(set.minimum, Some(0.5));
        assert_eq!(set.maximum, Some(100.0));
        assert_eq!(set.min_items, Some(1));
        assert_eq!(set.max_items, Some(10));
    }

    #[test]
    fn test_membership_lists() {
        let set = extract_constraints(&[
            ann("IsIn", &[r#"["admin", "user"]"#]),
            ann("is_not_in", &[r#"["root"]"#]),
        ]);

        assert_eq!(
            set.enum_values,
            Some(vec!["admin".to_string(), "user".to_string()])
        );
        assert_eq!(set.not_in, Some(vec!["root".to_string()]));
    }

    #[test]
    fn test_unknown_and_malformed_annotations_are_ignored() {
        let set = extract_constraints(&[
            ann("ApiProperty", &["whatever"]),
            ann("MinLength", &["three"]),
        ]);

        assert!(set.is_empty());
    }

    #[test]
    fn test_explicit_optional_wins_over_presence() {
        let set = extract_constraints(&[ann("IsNotEmpty", &[]), ann("IsOptional", &[])]);
        assert!(!is_required(&prop(false, false), &set));

        let set = extract_constraints(&[ann("IsOptional", &[]), ann("IsDefined", &[])]);
        assert!(!is_required(&prop(false, false), &set));
    }

    #[test]
    fn test_required_from_declaration_and_presence() {
        let none = ConstraintSet::default();
        assert!(is_required(&prop(false, false), &none));
        assert!(!is_required(&prop(true, false), &none));
        assert!(!is_required(&prop(false, true), &none));

        let presence = extract_constraints(&[ann("IsNotEmpty", &[])]);
        assert!(is_required(&prop(true, false), &presence));
    }
}
