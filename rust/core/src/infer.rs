// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value type inference.
//!
//! Values are normalized first (numeric strings become numbers), then typed.
//! Key hints only decide the type; they never change the value.

use crate::value::{ParamValue, ValueKind};

/// Revit group whose parameters are always treated as text.
pub const IDENTITY_DATA_GROUP: &str = "Identity Data";

/// Type forced by the key or group alone, before looking at the value.
///
/// `key` is the full dotted id; `name` is its leaf.
pub fn key_hint(key: &str, name: &str, group: &str) -> Option<ValueKind> {
    let contains = |needle: &str| key.contains(needle) || name.contains(needle);
    if contains("Id") || contains("GlobalId") {
        return Some(ValueKind::String);
    }
    if contains("Type") || contains("Category") {
        return Some(ValueKind::String);
    }
    if group.eq_ignore_ascii_case(IDENTITY_DATA_GROUP) {
        return Some(ValueKind::String);
    }
    None
}

/// Infers the column type of a normalized value. First match wins:
/// key hint, equation result type, then runtime shape.
pub fn infer_type(key: &str, name: &str, group: &str, value: &ParamValue) -> ValueKind {
    if let Some(kind) = key_hint(key, name, group) {
        return kind;
    }
    match value {
        ParamValue::Equation(eq) => match eq.result_type {
            ValueKind::Equation => ValueKind::String,
            declared => declared,
        },
        other => other.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Equation;

    fn infer(name: &str, group: &str, value: &ParamValue) -> ValueKind {
        infer_type(name, name, group, value)
    }

    #[test]
    fn runtime_shapes() {
        assert_eq!(infer("Height", "Dimensions", &ParamValue::Number(3000.0)), ValueKind::Number);
        assert_eq!(infer("IsExternal", "Pset", &ParamValue::Bool(true)), ValueKind::Boolean);
        assert_eq!(infer("Layers", "Other", &ParamValue::Array(vec![])), ValueKind::Array);
        assert_eq!(
            infer("Acoustic", "Other", &ParamValue::Object(Default::default())),
            ValueKind::Object
        );
        assert_eq!(infer("Material", "Parameters", &"Concrete".into()), ValueKind::String);
    }

    #[test]
    fn key_rules_take_precedence() {
        let n = ParamValue::Number(42.0);
        assert_eq!(infer("ElementId", "Other", &n), ValueKind::String);
        assert_eq!(infer("GlobalId", "Other", &n), ValueKind::String);
        assert_eq!(infer("Family and Type", "Other", &n), ValueKind::String);
        assert_eq!(infer("Category", "Other", &n), ValueKind::String);
        assert_eq!(infer("Mark", IDENTITY_DATA_GROUP, &n), ValueKind::String);
        // Lowercase "id" inside a word is not an identifier.
        assert_eq!(infer("Width", "Dimensions", &n), ValueKind::Number);
    }

    #[test]
    fn hints_test_the_full_key() {
        let n = ParamValue::Number(3.0);
        assert_eq!(infer_type("ElementIds.Count", "Count", "ElementIds", &n), ValueKind::String);
        assert_eq!(infer_type("TypeData.Width", "Width", "TypeData", &n), ValueKind::String);
        assert_eq!(infer_type("Dimensions.Count", "Count", "Dimensions", &n), ValueKind::Number);
    }

    #[test]
    fn equation_uses_declared_result_type() {
        let eq = ParamValue::Equation(Equation {
            expression: "Width * Height".into(),
            references: vec!["Width".into(), "Height".into()],
            result_type: ValueKind::Number,
        });
        assert_eq!(infer("Area", "Dimensions", &eq), ValueKind::Number);
    }

    #[test]
    fn hinted_keys_keep_the_coerced_value() {
        let value = ParamValue::from("12345").normalize();
        assert_eq!(value, ParamValue::Number(12345.0));
        assert_eq!(infer("ElementId", "Parameters", &value), ValueKind::String);
    }
}
