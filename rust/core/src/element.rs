// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input elements as supplied by the model viewer.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One model element with its free-form parameter bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Explicit parent/child flag from the authoring tool, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_child: Option<bool>,
    /// Mark or id of the hosting parent element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl Element {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            parameters: Map::new(),
            is_child: None,
            host: None,
        }
    }

    /// Builder-style parameter insertion.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Human-readable mark: a `Mark` parameter in any group.
    pub fn mark(&self) -> Option<String> {
        self.parameters.iter().find_map(|(key, value)| {
            let leaf = key.rsplit('.').next().unwrap_or(key);
            if !leaf.eq_ignore_ascii_case("mark") {
                return None;
            }
            match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        })
    }
}

/// The two disjoint row partitions of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Parent,
    Child,
}

impl Partition {
    pub const ALL: [Partition; 2] = [Partition::Parent, Partition::Child];

    pub fn is_parent(&self) -> bool {
        matches!(self, Partition::Parent)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Parent => f.write_str("parent"),
            Partition::Child => f.write_str("child"),
        }
    }
}
