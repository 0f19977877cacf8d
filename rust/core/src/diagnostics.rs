// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recoverable extraction problems and per-pass statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What went wrong with a single parameter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    /// A `{...}` string did not parse as a JSON object; the string was kept.
    MalformedNested,
    /// A value could not be decoded; a string rendering was kept.
    UnprocessableValue,
}

/// A per-key problem that was recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionIssue {
    pub kind: IssueKind,
    pub element_id: Option<String>,
    pub key: String,
    pub message: String,
}

impl ExtractionIssue {
    pub fn new(
        kind: IssueKind,
        element_id: Option<&str>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            element_id: element_id.map(str::to_string),
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Counts gathered while flattening. Used for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    pub elements: usize,
    pub parameters: usize,
    pub per_group: BTreeMap<String, usize>,
    pub system_skipped: usize,
    pub nested_expanded: usize,
    pub nulls_dropped: usize,
}

impl ExtractionStats {
    pub fn record(&mut self, group: &str) {
        self.parameters += 1;
        *self.per_group.entry(group.to_string()).or_default() += 1;
    }

    pub fn merge(&mut self, other: ExtractionStats) {
        self.elements += other.elements;
        self.parameters += other.parameters;
        self.system_skipped += other.system_skipped;
        self.nested_expanded += other.nested_expanded;
        self.nulls_dropped += other.nulls_dropped;
        for (group, count) in other.per_group {
            *self.per_group.entry(group).or_default() += count;
        }
    }
}

/// Issues and statistics returned alongside a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub issues: Vec<ExtractionIssue>,
    pub stats: ExtractionStats,
}

impl Diagnostics {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|issue| issue.kind == kind).count()
    }

    pub fn absorb(&mut self, issues: Vec<ExtractionIssue>, stats: ExtractionStats) {
        self.issues.extend(issues);
        self.stats.merge(stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_adds_group_counts() {
        let mut a = ExtractionStats::default();
        a.record("Dimensions");
        a.record("Parameters");

        let mut b = ExtractionStats::default();
        b.record("Dimensions");
        b.system_skipped = 2;

        a.merge(b);
        assert_eq!(a.parameters, 3);
        assert_eq!(a.per_group.get("Dimensions"), Some(&2));
        assert_eq!(a.system_skipped, 2);
    }
}
