// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Column definitions for the schedule table.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::selection::SelectedParameter;
use crate::value::ValueKind;

/// A renderable table column.
///
/// `header_override`, `width`, `sortable` and `filterable` are display-only
/// and sticky: rebuilding columns from a fresh selection keeps them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub id: String,
    pub name: String,
    /// Row field the column reads; the parameter id.
    pub field: String,
    pub header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_override: Option<String>,
    #[serde(rename = "type")]
    pub value_type: ValueKind,
    pub group: String,
    pub visible: bool,
    pub order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filterable: Option<bool>,
    pub removable: bool,
}

/// User edits applied directly to a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnOverrides {
    /// New header text. An empty string restores the parameter name.
    pub header: Option<String>,
    pub width: Option<f32>,
    pub sortable: Option<bool>,
    pub filterable: Option<bool>,
}

impl ColumnDefinition {
    fn from_selected(param: &SelectedParameter) -> Self {
        Self {
            id: param.id.clone(),
            name: param.name.clone(),
            field: param.id.clone(),
            header: param.name.clone(),
            header_override: None,
            value_type: param.value_type,
            group: param.group.clone(),
            visible: param.visible,
            order: param.order,
            width: None,
            sortable: None,
            filterable: None,
            removable: param.is_removable(),
        }
    }

    /// Applies user overrides; fields left as `None` are untouched.
    pub fn apply(&mut self, overrides: &ColumnOverrides) {
        if let Some(header) = &overrides.header {
            let header = header.trim();
            self.header_override = (!header.is_empty()).then(|| header.to_string());
            self.header = self.header_override.clone().unwrap_or_else(|| self.name.clone());
        }
        if overrides.width.is_some() {
            self.width = overrides.width;
        }
        if overrides.sortable.is_some() {
            self.sortable = overrides.sortable;
        }
        if overrides.filterable.is_some() {
            self.filterable = overrides.filterable;
        }
    }
}

/// Builds columns for a selection, carrying sticky display fields over from
/// `existing` columns with the same id. Output is ordered by `order`.
pub fn build_columns(
    selected: &[SelectedParameter],
    existing: &[ColumnDefinition],
) -> Vec<ColumnDefinition> {
    let existing_by_id: FxHashMap<&str, &ColumnDefinition> =
        existing.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut columns: Vec<ColumnDefinition> = selected
        .iter()
        .map(|param| {
            let mut column = ColumnDefinition::from_selected(param);
            if let Some(previous) = existing_by_id.get(param.id.as_str()) {
                column.header_override = previous.header_override.clone();
                column.width = previous.width;
                column.sortable = previous.sortable;
                column.filterable = previous.filterable;
                if let Some(header) = &column.header_override {
                    column.header = header.clone();
                }
            }
            column
        })
        .collect();

    columns.sort_by_key(|c| c.order);
    columns
}
