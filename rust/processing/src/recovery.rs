// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconstitution of a usable raw set after a failed pass.

use schedule_lite_core::{
    assign_roles, CategoryConfig, Element, ParamValue, Partition, RawMetadata, RawParameter,
    IDENTITY_DATA_GROUP,
};
use serde::{Deserialize, Serialize};

use crate::cache::ParameterCache;

/// Where a recovered raw set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoverySource {
    Cache,
    Minimal,
}

/// Recovered raw parameters split by partition.
#[derive(Debug, Clone)]
pub struct Recovered {
    pub source: RecoverySource,
    pub parent: Vec<RawParameter>,
    pub child: Vec<RawParameter>,
}

impl Recovered {
    fn from_raw(source: RecoverySource, raw: Vec<RawParameter>) -> Self {
        let (parent, child) = raw.into_iter().partition(|p| p.partition() == Partition::Parent);
        Self { source, parent, child }
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty() && self.child.is_empty()
    }
}

/// `Identity Data.Element Id` and `Identity Data.Category` for every element
/// the category filter keeps.
pub fn minimal_raw_parameters(elements: &[Element], categories: &CategoryConfig) -> Vec<RawParameter> {
    let roles = assign_roles(elements, categories);
    let mut raw = Vec::with_capacity(elements.len() * 2);

    for (element, assignment) in elements.iter().zip(roles) {
        let Some(partition) = assignment.role.partition() else {
            continue;
        };
        let metadata = RawMetadata {
            category: Some(element.category.clone()),
            is_system: true,
            is_parent: partition.is_parent(),
            element_id: Some(element.id.clone()),
            ..Default::default()
        };
        for (name, value) in [("Element Id", &element.id), ("Category", &element.category)] {
            raw.push(RawParameter {
                id: format!("{}.{}", IDENTITY_DATA_GROUP, name),
                name: name.to_string(),
                value: ParamValue::String(value.clone()),
                source_group: IDENTITY_DATA_GROUP.to_string(),
                metadata: metadata.clone(),
            });
        }
    }
    raw
}

/// Prefers a valid cache entry, else the minimal identity set.
pub async fn recover(cache: &ParameterCache, elements: &[Element], categories: &CategoryConfig) -> Recovered {
    if let Some(raw) = cache.load().await.filter(|raw| !raw.is_empty()) {
        tracing::info!(parameters = raw.len(), "Recovered parameters from cache");
        return Recovered::from_raw(RecoverySource::Cache, raw);
    }

    let raw = minimal_raw_parameters(elements, categories);
    tracing::info!(parameters = raw.len(), "Recovered minimal identity parameters");
    Recovered::from_raw(RecoverySource::Minimal, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::config::PipelineConfig;

    fn elements() -> Vec<Element> {
        vec![
            Element::new("wall1", "Walls"),
            Element::new("win1", "Windows"),
            Element::new("duct1", "Ducts"),
        ]
    }

    #[test]
    fn minimal_set_skips_excluded_elements() {
        let categories = CategoryConfig::new(vec!["Walls".into()], vec!["Windows".into()]);
        let raw = minimal_raw_parameters(&elements(), &categories);
        assert_eq!(raw.len(), 4);
        assert!(raw.iter().all(|p| p.metadata.is_system));
        assert!(raw.iter().all(|p| p.source_group == IDENTITY_DATA_GROUP));

        let wall_id = &raw[0];
        assert_eq!(wall_id.id, "Identity Data.Element Id");
        assert_eq!(wall_id.value, ParamValue::String("wall1".into()));
        assert!(wall_id.metadata.is_parent);
        assert!(!raw[2].metadata.is_parent);
    }

    #[tokio::test]
    async fn cache_wins_over_minimal_set() {
        let config = PipelineConfig {
            cache_key: "recovery:test".into(),
            ..PipelineConfig::default()
        };
        let cache = ParameterCache::new(Box::new(MemoryStorage::new()), &config);
        let categories = CategoryConfig::new(vec!["Walls".into()], vec!["Windows".into()]);

        let recovered = recover(&cache, &elements(), &categories).await;
        assert_eq!(recovered.source, RecoverySource::Minimal);
        assert_eq!(recovered.parent.len(), 2);
        assert_eq!(recovered.child.len(), 2);

        let mut cached = minimal_raw_parameters(&elements()[..1], &categories);
        cached[0].value = ParamValue::String("cached".into());
        assert!(cache.save(&cached).await);
        let recovered = recover(&cache, &elements(), &categories).await;
        assert_eq!(recovered.source, RecoverySource::Cache);
        assert_eq!(recovered.parent, cached);
        assert!(recovered.child.is_empty());
    }
}
