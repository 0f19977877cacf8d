// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter values decoded from an element's property bag.
//!
//! Values arrive as loosely typed JSON. They are decoded once, at the
//! boundary, into [`ParamValue`]; everything downstream matches on the enum.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The fixed set of column value types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    String,
    Number,
    Boolean,
    Array,
    Object,
    Equation,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Equation => "equation",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A formula descriptor. Only its declared result type matters here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equation {
    pub expression: String,
    #[serde(default)]
    pub references: Vec<String>,
    pub result_type: ValueKind,
}

/// Wire shape of an equation: `{ kind: "equation", expression, references, resultType }`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EquationWire {
    #[allow(dead_code)]
    kind: String,
    expression: String,
    #[serde(default)]
    references: Vec<String>,
    result_type: ValueKind,
}

/// A decoded parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ParamValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<ParamValue>),
    Object(BTreeMap<String, ParamValue>),
    Equation(Equation),
}

/// Returns true for objects tagged `kind: "equation"`.
pub fn is_equation_object(map: &Map<String, Value>) -> bool {
    matches!(map.get("kind"), Some(Value::String(kind)) if kind == "equation")
}

impl ParamValue {
    /// Strictly decodes a JSON value.
    ///
    /// Fails only when an object claims to be an equation but does not have
    /// the equation shape; callers fall back to [`ParamValue::fallback`].
    pub fn decode(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Object(map) if is_equation_object(map) => {
                let wire: EquationWire = serde_json::from_value(value.clone())
                    .map_err(|e| format!("malformed equation descriptor: {}", e))?;
                Ok(ParamValue::Equation(Equation {
                    expression: wire.expression,
                    references: wire.references,
                    result_type: wire.result_type,
                }))
            }
            other => Ok(ParamValue::from(other.clone())),
        }
    }

    /// Best-effort string rendering of a value that could not be decoded.
    pub fn fallback(value: &Value) -> Self {
        match value {
            Value::String(s) => ParamValue::String(s.clone()),
            other => ParamValue::String(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Runtime shape of the value. `Null` reports as string.
    pub fn kind(&self) -> ValueKind {
        match self {
            ParamValue::Null | ParamValue::String(_) => ValueKind::String,
            ParamValue::Bool(_) => ValueKind::Boolean,
            ParamValue::Number(_) => ValueKind::Number,
            ParamValue::Array(_) => ValueKind::Array,
            ParamValue::Object(_) => ValueKind::Object,
            ParamValue::Equation(_) => ValueKind::Equation,
        }
    }

    /// Plain text used for display and host matching.
    pub fn render(&self) -> String {
        match self {
            ParamValue::Null => String::new(),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Number(n) => format_number(*n),
            ParamValue::String(s) => s.clone(),
            ParamValue::Equation(eq) => eq.expression.clone(),
            ParamValue::Array(_) | ParamValue::Object(_) => Value::from(self.clone()).to_string(),
        }
    }

    /// Normalizes a freshly decoded value.
    ///
    /// Blank strings and NaN become `Null`; strings that parse as finite
    /// numbers become numbers.
    pub fn normalize(self) -> Self {
        match self {
            ParamValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return ParamValue::Null;
                }
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_nan() => ParamValue::Null,
                    Ok(n) if n.is_finite() => ParamValue::Number(n),
                    _ => ParamValue::String(s),
                }
            }
            ParamValue::Number(n) if n.is_nan() => ParamValue::Null,
            other => other,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ParamValue::Null,
            Value::Bool(b) => ParamValue::Bool(b),
            Value::Number(n) => n.as_f64().map(ParamValue::Number).unwrap_or(ParamValue::Null),
            Value::String(s) => ParamValue::String(s),
            Value::Array(items) => ParamValue::Array(items.into_iter().map(ParamValue::from).collect()),
            Value::Object(map) => {
                if is_equation_object(&map) {
                    if let Ok(ParamValue::Equation(eq)) = ParamValue::decode(&Value::Object(map.clone())) {
                        return ParamValue::Equation(eq);
                    }
                }
                ParamValue::Object(map.into_iter().map(|(k, v)| (k, ParamValue::from(v))).collect())
            }
        }
    }
}

impl From<ParamValue> for Value {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Null => Value::Null,
            ParamValue::Bool(b) => Value::Bool(b),
            ParamValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
                    Value::from(n as i64)
                } else {
                    serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
                }
            }
            ParamValue::String(s) => Value::String(s),
            ParamValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            ParamValue::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
            ParamValue::Equation(eq) => {
                let mut map = Map::new();
                map.insert("kind".into(), Value::String("equation".into()));
                map.insert("expression".into(), Value::String(eq.expression));
                map.insert(
                    "references".into(),
                    Value::Array(eq.references.into_iter().map(Value::String).collect()),
                );
                map.insert("resultType".into(), Value::String(eq.result_type.as_str().into()));
                Value::Object(map)
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Number(n)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_strings_coerce() {
        assert_eq!(ParamValue::from("3000").normalize(), ParamValue::Number(3000.0));
        assert_eq!(ParamValue::from(" 2.5 ").normalize(), ParamValue::Number(2.5));
        assert_eq!(
            ParamValue::from("Concrete").normalize(),
            ParamValue::String("Concrete".into())
        );
    }

    #[test]
    fn leading_zeros_are_coerced() {
        assert_eq!(ParamValue::from("007").normalize(), ParamValue::Number(7.0));
    }

    #[test]
    fn blank_and_nan_become_null() {
        assert!(ParamValue::from("   ").normalize().is_null());
        assert!(ParamValue::from("").normalize().is_null());
        assert!(ParamValue::from("NaN").normalize().is_null());
        assert!(ParamValue::Number(f64::NAN).normalize().is_null());
    }

    #[test]
    fn infinite_strings_stay_strings() {
        assert_eq!(ParamValue::from("inf").normalize(), ParamValue::String("inf".into()));
    }

    #[test]
    fn decodes_equation_descriptor() {
        let raw = json!({
            "kind": "equation",
            "expression": "Width * Height",
            "references": ["Width", "Height"],
            "resultType": "number"
        });
        let value = ParamValue::decode(&raw).unwrap();
        match value {
            ParamValue::Equation(eq) => {
                assert_eq!(eq.result_type, ValueKind::Number);
                assert_eq!(eq.references.len(), 2);
            }
            other => panic!("expected equation, got {:?}", other),
        }
    }

    #[test]
    fn malformed_equation_is_an_error() {
        let raw = json!({ "kind": "equation", "resultType": "number" });
        assert!(ParamValue::decode(&raw).is_err());
        // Lenient conversion keeps it as a plain object.
        assert_eq!(ParamValue::from(raw).kind(), ValueKind::Object);
    }

    #[test]
    fn json_conversion_keeps_integers_integral() {
        let value: Value = ParamValue::Number(3000.0).into();
        assert_eq!(value, json!(3000));
        let value: Value = ParamValue::Number(0.25).into();
        assert_eq!(value, json!(0.25));
    }

    #[test]
    fn equation_serializes_with_kind_tag() {
        let eq = ParamValue::Equation(Equation {
            expression: "A + B".into(),
            references: vec!["A".into(), "B".into()],
            result_type: ValueKind::Number,
        });
        let text = serde_json::to_string(&eq).unwrap();
        let back: ParamValue = serde_json::from_str(&text).unwrap();
        assert_eq!(back, eq);
        assert!(text.contains("\"kind\":\"equation\""));
    }

    #[test]
    fn render_formats_whole_numbers_without_fraction() {
        assert_eq!(ParamValue::Number(12.0).render(), "12");
        assert_eq!(ParamValue::Number(1.5).render(), "1.5");
        assert_eq!(ParamValue::Null.render(), "");
    }
}
