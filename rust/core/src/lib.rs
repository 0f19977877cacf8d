// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Schedule-Lite Core
//!
//! Turns the parameter bags of BIM elements (Revit and IFC exports) into a
//! stable, user-customizable set of schedule columns.
//!
//! ## Overview
//!
//! A pass runs leaf-first through these steps:
//!
//! - **Flattening** ([`flatten`]): `Group.Leaf` keys and nested property sets,
//!   inline or JSON-encoded, become flat `(group, name, value)` entries
//! - **Typing** ([`infer`]): numeric strings are coerced, blanks dropped, and
//!   each value gets one [`ValueKind`]
//! - **Raw parameters** ([`raw`]): per-element records with provenance
//! - **Classification** ([`classify`]): BIM origin and parent/child partition
//! - **Merging** ([`available`]): one available parameter per name
//! - **Reconciliation** ([`selection`], [`columns`]): user visibility, order,
//!   values and column overrides carried across passes
//!
//! ## Quick Start
//!
//! ```rust
//! use schedule_lite_core::{run_pass, CategoryConfig, Element, PartitionData};
//!
//! let elements = vec![Element::new("wall1", "Walls")
//!     .with_parameter("Identity Data.Mark", "W1")
//!     .with_parameter("Dimensions.Height", 3000)];
//! let categories = CategoryConfig::new(vec!["Walls".into()], vec![]);
//!
//! let pass = run_pass(&elements, &categories, &PartitionData::default(), &PartitionData::default())
//!     .expect("pass");
//! assert_eq!(pass.parent.columns.len(), 2);
//! ```

pub mod available;
pub mod classify;
pub mod columns;
pub mod diagnostics;
pub mod element;
pub mod error;
pub mod flatten;
pub mod infer;
pub mod partition;
pub mod pipeline;
pub mod raw;
pub mod selection;
pub mod value;

pub use available::{
    merge_raw_parameters, normalize_name, AvailableBimParameter, AvailableParameter, AvailableSet,
    AvailableUserParameter, BimMetadata,
};
pub use classify::{
    assign_roles, classify_source, is_bim_parameter, BimOrigin, CategoryConfig, ElementAssignment,
    ElementRole,
};
pub use columns::{build_columns, ColumnDefinition, ColumnOverrides};
pub use diagnostics::{Diagnostics, ExtractionIssue, ExtractionStats, IssueKind};
pub use element::{Element, Partition};
pub use error::{Error, Result};
pub use flatten::{flatten_parameters, split_grouped_key, DEFAULT_GROUP, SYSTEM_PREFIX};
pub use infer::{infer_type, IDENTITY_DATA_GROUP};
pub use partition::PartitionData;
pub use pipeline::{extract, run_pass, Extraction, PassOutput};
pub use raw::{build_raw_parameters, RawMetadata, RawParameter};
pub use selection::{reconcile_selection, ParameterKind, SelectedParameter};
pub use value::{Equation, ParamValue, ValueKind};
