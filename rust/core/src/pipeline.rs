// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extraction of raw parameters for a whole element population.

use serde::{Deserialize, Serialize};

use crate::classify::{assign_roles, CategoryConfig, ElementAssignment};
use crate::diagnostics::{Diagnostics, IssueKind};
use crate::element::{Element, Partition};
use crate::error::{Error, Result};
use crate::partition::PartitionData;
use crate::raw::{build_raw_parameters, RawParameter};

/// Raw parameters of one pass, split by partition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub parent: Vec<RawParameter>,
    pub child: Vec<RawParameter>,
    pub hierarchy: Vec<ElementAssignment>,
    pub diagnostics: Diagnostics,
}

/// Flattens, normalizes and partitions the parameters of every element.
///
/// Fails when no element carries any parameter, or when every parameter in
/// the batch had to be degraded. Individual problems are returned in the
/// diagnostics.
pub fn extract(elements: &[Element], categories: &CategoryConfig) -> Result<Extraction> {
    if elements.iter().all(|e| e.parameters.is_empty()) {
        return Err(Error::NoParameters);
    }

    let hierarchy = assign_roles(elements, categories);
    let mut extraction = Extraction::default();

    for (element, assignment) in elements.iter().zip(&hierarchy) {
        let Some(partition) = assignment.role.partition() else {
            continue;
        };
        let build = build_raw_parameters(element, partition);
        match partition {
            Partition::Parent => extraction.parent.extend(build.parameters),
            Partition::Child => extraction.child.extend(build.parameters),
        }
        extraction.diagnostics.absorb(build.issues, build.stats);
    }
    extraction.hierarchy = hierarchy;

    let degraded = extraction.diagnostics.count(IssueKind::UnprocessableValue);
    let emitted = extraction.parent.len() + extraction.child.len();
    if degraded > 0 && degraded >= emitted {
        return Err(Error::AllParametersFailed { failed: degraded });
    }

    tracing::debug!(
        elements = elements.len(),
        parent = extraction.parent.len(),
        child = extraction.child.len(),
        issues = extraction.diagnostics.issues.len(),
        "Extracted raw parameters"
    );
    Ok(extraction)
}

/// Output of a complete synchronous pass.
#[derive(Debug, Clone)]
pub struct PassOutput {
    pub parent: PartitionData,
    pub child: PartitionData,
    pub hierarchy: Vec<ElementAssignment>,
    pub diagnostics: Diagnostics,
}

/// Runs every step of a pass against the previous partition states.
pub fn run_pass(
    elements: &[Element],
    categories: &CategoryConfig,
    previous_parent: &PartitionData,
    previous_child: &PartitionData,
) -> Result<PassOutput> {
    let extraction = extract(elements, categories)?;
    Ok(PassOutput {
        parent: previous_parent.derive(extraction.parent),
        child: previous_child.derive(extraction.child),
        hierarchy: extraction.hierarchy,
        diagnostics: extraction.diagnostics,
    })
}
