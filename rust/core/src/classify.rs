// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter and element classification.
//!
//! Two independent decisions are made here:
//!
//! - **Source**: whether a raw parameter is model-sourced ("BIM"). Group
//!   allow-list, IFC property-set prefix, explicit metadata and key patterns
//!   are checked in that order; the first hit is reported as the origin.
//! - **Partition**: whether an element, and with it every parameter it
//!   carries, belongs to the parent or the child rows. Children whose host
//!   cannot be matched to a parent are reported as orphaned.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::element::{Element, Partition};
use crate::flatten::split_grouped_key;
use crate::raw::RawParameter;

/// Prefix of IFC property set groups.
pub const IFC_PSET_PREFIX: &str = "Pset_";

/// Groups that are known to come from the authoring tools.
pub const BIM_GROUPS: &[&str] = &[
    "Identity Data",
    "Dimensions",
    "Constraints",
    "Phasing",
    "Structural",
    "Structural Analysis",
    "Analytical Properties",
    "Materials and Finishes",
    "Materials",
    "Construction",
    "Graphics",
    "Text",
    "Data",
    "General",
    "Other",
    "Mechanical",
    "Mechanical - Flow",
    "Electrical",
    "Electrical - Loads",
    "Plumbing",
    "Fire Protection",
    "Energy Analysis",
    "Green Building Properties",
    "IFC Parameters",
    "IFC",
    "Revit",
    "Element",
];

static BIM_KEY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(category|type|family|material)s?$",
        r"(?i)^(fm|cobie)[\s_.\-]",
        r"(?i)(mark|number|position)$",
        r"(?i)^(ifc|revit)[\s_.\-]?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("bim key pattern"))
    .collect()
});

/// Why a parameter was classified as model-sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BimOrigin {
    GroupAllowList,
    IfcPropertySet,
    Metadata,
    KeyPattern,
    /// Not matched by any rule, but discovered on the model during extraction.
    Extraction,
}

fn is_bim_group(group: &str) -> Option<BimOrigin> {
    if BIM_GROUPS.iter().any(|g| g.eq_ignore_ascii_case(group)) {
        return Some(BimOrigin::GroupAllowList);
    }
    if group.starts_with(IFC_PSET_PREFIX) {
        return Some(BimOrigin::IfcPropertySet);
    }
    None
}

/// Returns true when the key matches one of the curated BIM key patterns.
pub fn matches_bim_key(key: &str) -> bool {
    BIM_KEY_PATTERNS.iter().any(|re| re.is_match(key))
}

/// Classifies the source of a raw parameter. `None` means user-created.
///
/// Nested parameters are judged by the group of the key they were expanded
/// from, and a property-set named parent key counts as well.
pub fn classify_source(raw: &RawParameter) -> Option<BimOrigin> {
    let group_origin = match raw.metadata.parent_key.as_deref() {
        Some(parent_key) => {
            let (parent_group, parent_leaf) = split_grouped_key(parent_key);
            is_bim_group(&parent_group).or_else(|| {
                parent_leaf
                    .starts_with(IFC_PSET_PREFIX)
                    .then_some(BimOrigin::IfcPropertySet)
            })
        }
        None => is_bim_group(&raw.source_group),
    };
    if group_origin.is_some() {
        return group_origin;
    }
    if raw.metadata.is_system {
        return Some(BimOrigin::Metadata);
    }
    if matches_bim_key(&raw.name) || matches_bim_key(&raw.id) {
        return Some(BimOrigin::KeyPattern);
    }
    None
}

pub fn is_bim_parameter(raw: &RawParameter) -> bool {
    classify_source(raw).is_some()
}

/// Parent and child category allow-lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    pub parent_categories: Vec<String>,
    pub child_categories: Vec<String>,
}

impl CategoryConfig {
    pub fn new(parents: Vec<String>, children: Vec<String>) -> Self {
        Self {
            parent_categories: parents,
            child_categories: children,
        }
    }

    /// No filter configured: every element is a parent.
    pub fn is_unfiltered(&self) -> bool {
        self.parent_categories.is_empty() && self.child_categories.is_empty()
    }

    pub fn is_parent_category(&self, category: &str) -> bool {
        contains_ignore_case(&self.parent_categories, category)
    }

    pub fn is_child_category(&self, category: &str) -> bool {
        contains_ignore_case(&self.child_categories, category)
    }

    /// Partition of an element, or `None` if the category filter excludes it.
    pub fn partition_of(&self, element: &Element) -> Option<Partition> {
        if self.is_unfiltered() {
            return Some(Partition::Parent);
        }
        if self.is_parent_category(&element.category) || element.is_child == Some(false) {
            return Some(Partition::Parent);
        }
        if self.is_child_category(&element.category) || element.is_child == Some(true) {
            return Some(Partition::Child);
        }
        None
    }
}

fn contains_ignore_case(list: &[String], value: &str) -> bool {
    let value = value.trim();
    list.iter().any(|c| c.trim().eq_ignore_ascii_case(value))
}

/// Where an element ended up in the parent/child hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum ElementRole {
    Parent,
    /// Child whose host matched the parent with this element id.
    #[serde(rename_all = "camelCase")]
    Child { parent_id: String },
    /// Child without a matching host parent.
    Orphaned,
    /// Filtered out by the category configuration.
    Excluded,
}

impl ElementRole {
    pub fn partition(&self) -> Option<Partition> {
        match self {
            ElementRole::Parent => Some(Partition::Parent),
            ElementRole::Child { .. } | ElementRole::Orphaned => Some(Partition::Child),
            ElementRole::Excluded => None,
        }
    }
}

/// Role assignment of one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementAssignment {
    pub element_id: String,
    pub category: String,
    #[serde(flatten)]
    pub role: ElementRole,
}

/// Assigns every element its role, matching child hosts against parent ids
/// and marks.
pub fn assign_roles(elements: &[Element], categories: &CategoryConfig) -> Vec<ElementAssignment> {
    let partitions: Vec<Option<Partition>> =
        elements.iter().map(|e| categories.partition_of(e)).collect();

    let mut parents_by_ref: FxHashMap<String, &str> = FxHashMap::default();
    for (element, partition) in elements.iter().zip(&partitions) {
        if *partition == Some(Partition::Parent) {
            parents_by_ref.entry(element.id.clone()).or_insert(&element.id);
            if let Some(mark) = element.mark() {
                parents_by_ref.entry(mark).or_insert(&element.id);
            }
        }
    }

    elements
        .iter()
        .zip(partitions)
        .map(|(element, partition)| {
            let role = match partition {
                Some(Partition::Parent) => ElementRole::Parent,
                Some(Partition::Child) => match element
                    .host
                    .as_deref()
                    .map(str::trim)
                    .and_then(|host| parents_by_ref.get(host))
                {
                    Some(parent_id) => ElementRole::Child {
                        parent_id: parent_id.to_string(),
                    },
                    None => ElementRole::Orphaned,
                },
                None => ElementRole::Excluded,
            };
            ElementAssignment {
                element_id: element.id.clone(),
                category: element.category.clone(),
                role,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawMetadata;
    use crate::value::ParamValue;

    fn raw(id: &str, group: &str) -> RawParameter {
        let (_, name) = split_grouped_key(id);
        RawParameter {
            id: id.to_string(),
            name,
            value: ParamValue::from("x"),
            source_group: group.to_string(),
            metadata: RawMetadata {
                is_parent: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn allow_listed_groups_are_bim() {
        assert_eq!(
            classify_source(&raw("Dimensions.Height", "Dimensions")),
            Some(BimOrigin::GroupAllowList)
        );
        assert_eq!(
            classify_source(&raw("identity data.Comments", "identity data")),
            Some(BimOrigin::GroupAllowList)
        );
    }

    #[test]
    fn property_sets_are_bim() {
        assert_eq!(
            classify_source(&raw("Pset_WallCommon.IsExternal", "Pset_WallCommon")),
            Some(BimOrigin::IfcPropertySet)
        );
    }

    #[test]
    fn key_patterns_are_bim() {
        for key in ["Structural Material", "Family and Type", "FM_Asset", "Door Number", "Host Position"] {
            assert_eq!(
                classify_source(&raw(key, "Parameters")),
                Some(BimOrigin::KeyPattern),
                "{}",
                key
            );
        }
    }

    #[test]
    fn unmatched_parameters_are_user() {
        assert_eq!(classify_source(&raw("Comments", "Parameters")), None);
        assert!(!is_bim_parameter(&raw("Cost", "Custom")));
    }

    #[test]
    fn metadata_flag_marks_bim() {
        let mut p = raw("Comments", "Parameters");
        p.metadata.is_system = true;
        assert_eq!(classify_source(&p), Some(BimOrigin::Metadata));
    }

    #[test]
    fn nested_parameters_inherit_from_parent_key() {
        let mut p = raw("Pset_WallCommon.Acoustic", "Parameters");
        p.name = "Acoustic".into();
        p.metadata.is_nested = true;
        p.metadata.parent_key = Some("Pset_WallCommon".into());
        assert_eq!(classify_source(&p), Some(BimOrigin::IfcPropertySet));

        let mut p = raw("Custom.Blob.Field", "Custom");
        p.name = "Field".into();
        p.metadata.is_nested = true;
        p.metadata.parent_key = Some("Custom.Blob".into());
        assert_eq!(classify_source(&p), None);
    }

    #[test]
    fn partition_precedence() {
        let config = CategoryConfig::new(vec!["Walls".into()], vec!["Windows".into()]);
        assert_eq!(config.partition_of(&Element::new("w", "walls")), Some(Partition::Parent));
        assert_eq!(config.partition_of(&Element::new("d", "Windows")), Some(Partition::Child));
        assert_eq!(config.partition_of(&Element::new("x", "Ducts")), None);

        let mut flagged = Element::new("y", "Ducts");
        flagged.is_child = Some(true);
        assert_eq!(config.partition_of(&flagged), Some(Partition::Child));
        flagged.is_child = Some(false);
        assert_eq!(config.partition_of(&flagged), Some(Partition::Parent));

        // Parent category wins over an explicit child flag.
        let mut wall = Element::new("w2", "Walls");
        wall.is_child = Some(true);
        assert_eq!(config.partition_of(&wall), Some(Partition::Parent));
    }

    #[test]
    fn unfiltered_config_makes_everything_parent() {
        let config = CategoryConfig::default();
        assert_eq!(config.partition_of(&Element::new("x", "Ducts")), Some(Partition::Parent));
    }

    #[test]
    fn children_match_hosts_by_mark_or_id() {
        let config = CategoryConfig::new(vec!["Walls".into()], vec!["Windows".into(), "Doors".into()]);
        let elements = vec![
            Element::new("wall1", "Walls").with_parameter("Identity Data.Mark", "W1"),
            Element::new("win1", "Windows").with_host("W1"),
            Element::new("door1", "Doors").with_host("wall1"),
            Element::new("win2", "Windows").with_host("W9"),
            Element::new("win3", "Windows"),
            Element::new("duct1", "Ducts"),
        ];
        let roles: Vec<ElementRole> = assign_roles(&elements, &config).into_iter().map(|a| a.role).collect();
        assert_eq!(
            roles,
            vec![
                ElementRole::Parent,
                ElementRole::Child { parent_id: "wall1".into() },
                ElementRole::Child { parent_id: "wall1".into() },
                ElementRole::Orphaned,
                ElementRole::Orphaned,
                ElementRole::Excluded,
            ]
        );
        assert_eq!(ElementRole::Orphaned.partition(), Some(Partition::Child));
    }
}
