// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Available parameters: one entry per normalized name per partition.
//!
//! Raw parameters scanned from many elements are merged by case-insensitive
//! name. The first occurrence fixes the identity (id, name, group). Values
//! only ever improve: a null placeholder is replaced by the first non-null
//! value seen, and a known value is never replaced afterwards.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::classify::{classify_source, BimOrigin};
use crate::error::{Error, Result};
use crate::infer::infer_type;
use crate::raw::RawParameter;
use crate::value::{ParamValue, ValueKind};

/// Prefix of ids generated for user-created parameters.
pub const USER_ID_PREFIX: &str = "user:";

/// Provenance summary of a merged BIM parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BimMetadata {
    pub origin: BimOrigin,
    /// Distinct element categories the parameter was seen on.
    pub categories: Vec<String>,
    /// Number of raw occurrences merged into this entry.
    pub occurrences: usize,
    pub is_nested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
}

/// A model-discovered parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableBimParameter {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueKind,
    pub value: ParamValue,
    pub source_group: String,
    pub current_group: String,
    pub visible: bool,
    pub metadata: BimMetadata,
}

/// A parameter created by the user through [`AvailableUserParameter::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableUserParameter {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueKind,
    pub value: ParamValue,
    pub group: String,
    pub visible: bool,
}

impl AvailableUserParameter {
    /// Creates a user parameter. The id is derived from group and name.
    pub fn new(name: &str, value_type: ValueKind, group: &str, initial: ParamValue) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidName);
        }
        let group = match group.trim() {
            "" => crate::flatten::DEFAULT_GROUP,
            g => g,
        };
        Ok(Self {
            id: format!("{}{}.{}", USER_ID_PREFIX, group, name),
            name: name.to_string(),
            value_type,
            value: initial.normalize(),
            group: group.to_string(),
            visible: true,
        })
    }

    /// Replaces the manually entered value. Equations keep their declared
    /// type; other parameters follow the new value's shape.
    pub fn set_value(&mut self, value: ParamValue) {
        let value = value.normalize();
        if self.value_type != ValueKind::Equation && !value.is_null() {
            self.value_type = infer_type(&self.id, &self.name, &self.group, &value);
        }
        self.value = value;
    }
}

/// Either kind of available parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AvailableParameter {
    Bim(AvailableBimParameter),
    User(AvailableUserParameter),
}

impl AvailableParameter {
    pub fn id(&self) -> &str {
        match self {
            AvailableParameter::Bim(p) => &p.id,
            AvailableParameter::User(p) => &p.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AvailableParameter::Bim(p) => &p.name,
            AvailableParameter::User(p) => &p.name,
        }
    }

    pub fn group(&self) -> &str {
        match self {
            AvailableParameter::Bim(p) => &p.current_group,
            AvailableParameter::User(p) => &p.group,
        }
    }
}

/// Available parameters of one partition, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableSet {
    pub bim: Vec<AvailableBimParameter>,
    pub user: Vec<AvailableUserParameter>,
}

impl AvailableSet {
    pub fn len(&self) -> usize {
        self.bim.len() + self.user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bim.is_empty() && self.user.is_empty()
    }

    /// True if any parameter already uses this normalized name.
    pub fn has_name(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.bim.iter().any(|p| normalize_name(&p.name) == key)
            || self.user.iter().any(|p| normalize_name(&p.name) == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = AvailableParameter> + '_ {
        self.bim
            .iter()
            .cloned()
            .map(AvailableParameter::Bim)
            .chain(self.user.iter().cloned().map(AvailableParameter::User))
    }
}

/// Normalized identity of a parameter name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Merges raw parameters of one partition into available BIM parameters.
///
/// `previous` supplies visibility and regrouping overrides for ids that
/// already existed; everything else starts visible in its source group.
pub fn merge_raw_parameters(
    raw: &[RawParameter],
    previous: &[AvailableBimParameter],
) -> Vec<AvailableBimParameter> {
    let previous_by_id: FxHashMap<&str, &AvailableBimParameter> =
        previous.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut merged: Vec<AvailableBimParameter> = Vec::new();

    for param in raw {
        let key = normalize_name(&param.name);
        if let Some(&slot) = index.get(&key) {
            let existing = &mut merged[slot];
            existing.metadata.occurrences += 1;
            if let Some(category) = &param.metadata.category {
                if !existing.metadata.categories.contains(category) {
                    existing.metadata.categories.push(category.clone());
                }
            }
            if existing.value.is_null() && !param.value.is_null() {
                existing.value = param.value.clone();
            }
            continue;
        }

        let previous = previous_by_id.get(param.id.as_str());
        index.insert(key, merged.len());
        merged.push(AvailableBimParameter {
            id: param.id.clone(),
            name: param.name.clone(),
            value_type: ValueKind::String,
            value: param.value.clone(),
            source_group: param.source_group.clone(),
            current_group: previous
                .map(|p| p.current_group.clone())
                .unwrap_or_else(|| param.source_group.clone()),
            visible: previous.map(|p| p.visible).unwrap_or(true),
            metadata: BimMetadata {
                origin: classify_source(param).unwrap_or(BimOrigin::Extraction),
                categories: param.metadata.category.iter().cloned().collect(),
                occurrences: 1,
                is_nested: param.metadata.is_nested,
                parent_key: param.metadata.parent_key.clone(),
            },
        });
    }

    for param in &mut merged {
        param.value_type = infer_type(&param.id, &param.name, &param.source_group, &param.value);
    }

    tracing::debug!(raw = raw.len(), available = merged.len(), "Merged raw parameters");
    merged
}
