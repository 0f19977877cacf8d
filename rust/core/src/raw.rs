// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw parameters: one record per flattened key per element.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{ExtractionIssue, ExtractionStats};
use crate::element::{Element, Partition};
use crate::flatten::flatten_parameters;
use crate::value::ParamValue;

/// Provenance of a raw parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Reserved or synthesized by the pipeline rather than read from the bag.
    #[serde(default)]
    pub is_system: bool,
    pub is_parent: bool,
    #[serde(default)]
    pub is_nested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

/// A parameter as read from one element, before deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParameter {
    /// Full dotted key.
    pub id: String,
    /// Leaf name.
    pub name: String,
    pub value: ParamValue,
    pub source_group: String,
    pub metadata: RawMetadata,
}

impl RawParameter {
    pub fn partition(&self) -> Partition {
        if self.metadata.is_parent {
            Partition::Parent
        } else {
            Partition::Child
        }
    }
}

/// Raw parameters of one element plus what was recovered along the way.
#[derive(Debug, Default)]
pub struct RawBuild {
    pub parameters: Vec<RawParameter>,
    pub issues: Vec<ExtractionIssue>,
    pub stats: ExtractionStats,
}

/// Builds the raw parameters of one element in the given partition.
///
/// Values are normalized; those that normalize to null are dropped.
pub fn build_raw_parameters(element: &Element, partition: Partition) -> RawBuild {
    let flat = flatten_parameters(&element.id, &element.parameters);
    let mut stats = flat.stats;
    stats.elements = 1;

    let mut parameters = Vec::with_capacity(flat.entries.len());
    for entry in flat.entries {
        let value = entry.value.normalize();
        if value.is_null() {
            stats.nulls_dropped += 1;
            continue;
        }
        parameters.push(RawParameter {
            metadata: RawMetadata {
                category: Some(element.category.clone()),
                is_system: false,
                is_parent: partition.is_parent(),
                is_nested: entry.parent_key.is_some(),
                parent_key: entry.parent_key,
                element_id: Some(element.id.clone()),
            },
            id: entry.id,
            name: entry.name,
            value,
            source_group: entry.group,
        });
    }

    RawBuild {
        parameters,
        issues: flat.issues,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_input_yields_one_parameter_per_key() {
        let element = Element::new("e1", "Walls")
            .with_parameter("Material", "Concrete")
            .with_parameter("Width", 200)
            .with_parameter("Fire Rated", true);
        let build = build_raw_parameters(&element, Partition::Parent);
        assert_eq!(build.parameters.len(), 3);
        assert!(build.parameters.iter().all(|p| p.source_group == "Parameters"));
        assert!(build.parameters.iter().all(|p| p.metadata.is_parent));
    }

    #[test]
    fn grouping_and_provenance() {
        let element = Element::new("wall1", "Walls")
            .with_parameter("Identity Data.Mark", "W1")
            .with_parameter("Dimensions.Height", 3000);
        let build = build_raw_parameters(&element, Partition::Parent);
        let mark = build.parameters.iter().find(|p| p.name == "Mark").unwrap();
        assert_eq!(mark.source_group, "Identity Data");
        assert_eq!(mark.metadata.element_id.as_deref(), Some("wall1"));
        assert_eq!(mark.metadata.category.as_deref(), Some("Walls"));
        let height = build.parameters.iter().find(|p| p.name == "Height").unwrap();
        assert_eq!(height.source_group, "Dimensions");
        assert_eq!(height.value, ParamValue::Number(3000.0));
    }

    #[test]
    fn null_like_values_are_dropped() {
        let element = Element::new("e1", "Walls")
            .with_parameter("Comments", "   ")
            .with_parameter("Offset", serde_json::Value::Null)
            .with_parameter("Length", "NaN")
            .with_parameter("Name", "A");
        let build = build_raw_parameters(&element, Partition::Child);
        assert_eq!(build.parameters.len(), 1);
        assert_eq!(build.stats.nulls_dropped, 3);
        assert_eq!(build.parameters[0].partition(), Partition::Child);
    }

    #[test]
    fn numeric_strings_become_numbers() {
        let element = Element::new("e1", "Walls").with_parameter("Dimensions.Length", "4500");
        let build = build_raw_parameters(&element, Partition::Parent);
        assert_eq!(build.parameters[0].value, ParamValue::Number(4500.0));
    }

    #[test]
    fn hinted_keys_are_coerced_too() {
        let element = Element::new("e1", "Walls")
            .with_parameter("Identity Data.Assembly Code", "3000")
            .with_parameter("ElementId", "12345");
        let build = build_raw_parameters(&element, Partition::Parent);
        let value = |id: &str| build.parameters.iter().find(|p| p.id == id).map(|p| p.value.clone());
        assert_eq!(value("Identity Data.Assembly Code"), Some(ParamValue::Number(3000.0)));
        assert_eq!(value("ElementId"), Some(ParamValue::Number(12345.0)));
    }
}
