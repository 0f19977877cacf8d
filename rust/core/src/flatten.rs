// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Group flattening of an element's parameter bag.
//!
//! Keys of the form `Group.Leaf` are split into a group and a leaf name.
//! Values that are JSON objects, either inline or encoded as a `{...}`
//! string, are expanded one level: each nested key becomes its own entry
//! with id `originalKey.nestedKey` in the original key's group. Deeper
//! levels stay as object values.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::diagnostics::{ExtractionIssue, ExtractionStats, IssueKind};
use crate::value::{is_equation_object, ParamValue};

/// Keys starting with this prefix are reserved for the viewer.
pub const SYSTEM_PREFIX: &str = "__";

/// Group assigned to keys without a group component.
pub const DEFAULT_GROUP: &str = "Parameters";

static GROUPED_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^.]+)\.(.+)$").expect("grouped key pattern"));

/// A flattened `(group, name, value)` triple with its full id.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatEntry {
    pub id: String,
    pub group: String,
    pub name: String,
    pub value: ParamValue,
    /// Key this entry was expanded from, for nested entries.
    pub parent_key: Option<String>,
}

/// Output of flattening one element.
#[derive(Debug, Default)]
pub struct FlattenOutput {
    pub entries: Vec<FlatEntry>,
    pub issues: Vec<ExtractionIssue>,
    pub stats: ExtractionStats,
}

#[inline]
pub fn is_system_key(key: &str) -> bool {
    key.starts_with(SYSTEM_PREFIX)
}

/// Splits `Group.Leaf` into its parts. Ungrouped keys land in [`DEFAULT_GROUP`].
pub fn split_grouped_key(key: &str) -> (String, String) {
    match GROUPED_KEY.captures(key) {
        Some(caps) => {
            let group = caps[1].trim();
            let leaf = caps[2].trim();
            if group.is_empty() || leaf.is_empty() {
                (DEFAULT_GROUP.to_string(), key.to_string())
            } else {
                (group.to_string(), leaf.to_string())
            }
        }
        None => (DEFAULT_GROUP.to_string(), key.to_string()),
    }
}

fn looks_like_json_object(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}')
}

/// Flattens one element's parameters.
pub fn flatten_parameters(element_id: &str, parameters: &Map<String, Value>) -> FlattenOutput {
    let mut out = FlattenOutput::default();

    for (key, raw) in parameters {
        if is_system_key(key) {
            out.stats.system_skipped += 1;
            continue;
        }

        let (group, name) = split_grouped_key(key);

        match raw {
            Value::String(s) if looks_like_json_object(s) => {
                match serde_json::from_str::<Map<String, Value>>(s.trim()) {
                    Ok(nested) => expand_nested(element_id, key, &group, &nested, &mut out),
                    Err(e) => {
                        tracing::debug!(element_id, key = %key, error = %e, "Nested JSON parse failed, keeping string");
                        out.issues.push(ExtractionIssue::new(
                            IssueKind::MalformedNested,
                            Some(element_id),
                            key.as_str(),
                            e.to_string(),
                        ));
                        push_entry(&mut out, key.clone(), group, name, ParamValue::String(s.clone()), None);
                    }
                }
            }
            Value::Object(nested) if !is_equation_object(nested) => {
                expand_nested(element_id, key, &group, nested, &mut out)
            }
            other => {
                let value = decode_or_fallback(element_id, key, other, &mut out.issues);
                push_entry(&mut out, key.clone(), group, name, value, None);
            }
        }
    }

    out
}

fn expand_nested(
    element_id: &str,
    parent_key: &str,
    group: &str,
    nested: &Map<String, Value>,
    out: &mut FlattenOutput,
) {
    out.stats.nested_expanded += 1;
    for (nested_key, raw) in nested {
        if is_system_key(nested_key) {
            out.stats.system_skipped += 1;
            continue;
        }
        let id = format!("{}.{}", parent_key, nested_key);
        let value = decode_or_fallback(element_id, &id, raw, &mut out.issues);
        push_entry(
            out,
            id,
            group.to_string(),
            nested_key.clone(),
            value,
            Some(parent_key.to_string()),
        );
    }
}

fn decode_or_fallback(
    element_id: &str,
    key: &str,
    raw: &Value,
    issues: &mut Vec<ExtractionIssue>,
) -> ParamValue {
    match ParamValue::decode(raw) {
        Ok(value) => value,
        Err(message) => {
            tracing::warn!(element_id, key, %message, "Degrading unprocessable value to string");
            issues.push(ExtractionIssue::new(
                IssueKind::UnprocessableValue,
                Some(element_id),
                key,
                message,
            ));
            ParamValue::fallback(raw)
        }
    }
}

fn push_entry(
    out: &mut FlattenOutput,
    id: String,
    group: String,
    name: String,
    value: ParamValue,
    parent_key: Option<String>,
) {
    out.stats.record(&group);
    out.entries.push(FlatEntry {
        id,
        group,
        name,
        value,
        parent_key,
    });
}
