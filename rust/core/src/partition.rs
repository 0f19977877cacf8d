// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The state of one partition and the user operations on it.
//!
//! Every mutation keeps `available`, `selected` and `columns` consistent:
//! the selection is reconciled against the available set and columns are
//! rebuilt from the selection, so orders stay contiguous after each write.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::available::{merge_raw_parameters, normalize_name, AvailableSet, AvailableUserParameter};
use crate::columns::{build_columns, ColumnDefinition, ColumnOverrides};
use crate::element::Partition;
use crate::error::{Error, Result};
use crate::raw::RawParameter;
use crate::selection::{move_parameter, reconcile_selection, set_visibility, SelectedParameter};
use crate::value::{ParamValue, ValueKind};

/// Everything derived for one partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionData {
    pub raw: Vec<RawParameter>,
    pub available: AvailableSet,
    pub selected: Vec<SelectedParameter>,
    pub columns: Vec<ColumnDefinition>,
}

impl PartitionData {
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.available.is_empty() && self.selected.is_empty()
    }

    /// Derives a new partition state from a fresh raw set, reconciling with
    /// `self` as the previous state. User parameters carry over untouched and
    /// keep their name: a model parameter with the same normalized name is
    /// left out of the available set.
    pub fn derive(&self, raw: Vec<RawParameter>) -> PartitionData {
        let user_names: FxHashSet<String> =
            self.available.user.iter().map(|p| normalize_name(&p.name)).collect();
        let mut bim = merge_raw_parameters(&raw, &self.available.bim);
        bim.retain(|p| {
            let shadowed = user_names.contains(&normalize_name(&p.name));
            if shadowed {
                tracing::warn!(id = %p.id, name = %p.name, "Model parameter shadowed by a user parameter");
            }
            !shadowed
        });
        let available = AvailableSet {
            bim,
            user: self.available.user.clone(),
        };
        let selected = reconcile_selection(&available, &self.selected);
        let columns = build_columns(&selected, &self.columns);
        PartitionData {
            raw,
            available,
            selected,
            columns,
        }
    }

    fn refresh(&mut self) {
        self.selected = reconcile_selection(&self.available, &self.selected);
        self.columns = build_columns(&self.selected, &self.columns);
    }

    fn rebuild_columns(&mut self) {
        self.columns = build_columns(&self.selected, &self.columns);
    }

    /// Adds a user-created parameter and returns its id.
    pub fn add_user_parameter(
        &mut self,
        partition: Partition,
        name: &str,
        value_type: ValueKind,
        group: &str,
        initial: ParamValue,
    ) -> Result<String> {
        let param = AvailableUserParameter::new(name, value_type, group, initial)?;
        if self.available.has_name(&param.name) {
            return Err(Error::DuplicateParameter {
                name: param.name,
                partition,
            });
        }
        let id = param.id.clone();
        self.available.user.push(param);
        self.refresh();
        Ok(id)
    }

    /// Removes a user-created parameter.
    pub fn remove_parameter(&mut self, partition: Partition, id: &str) -> Result<()> {
        let removable = self
            .selected
            .iter()
            .find(|p| p.id == id)
            .map(SelectedParameter::is_removable)
            .ok_or_else(|| unknown(id, partition))?;
        if !removable {
            return Err(Error::NotRemovable { id: id.to_string() });
        }
        self.available.user.retain(|p| p.id != id);
        self.refresh();
        Ok(())
    }

    pub fn set_visibility(&mut self, partition: Partition, id: &str, visible: bool) -> Result<()> {
        if !set_visibility(&mut self.selected, id, visible) {
            return Err(unknown(id, partition));
        }
        if let Some(p) = self.available.bim.iter_mut().find(|p| p.id == id) {
            p.visible = visible;
        } else if let Some(p) = self.available.user.iter_mut().find(|p| p.id == id) {
            p.visible = visible;
        }
        self.rebuild_columns();
        Ok(())
    }

    pub fn set_order(&mut self, partition: Partition, id: &str, new_order: usize) -> Result<()> {
        if !move_parameter(&mut self.selected, id, new_order) {
            return Err(unknown(id, partition));
        }
        self.rebuild_columns();
        Ok(())
    }

    /// Sets the manually entered value of a user parameter.
    pub fn set_user_value(&mut self, partition: Partition, id: &str, value: ParamValue) -> Result<()> {
        match self.available.user.iter_mut().find(|p| p.id == id) {
            Some(param) => param.set_value(value),
            None if self.available.bim.iter().any(|p| p.id == id) => {
                return Err(Error::ReadOnlyValue { id: id.to_string() })
            }
            None => return Err(unknown(id, partition)),
        }
        self.refresh();
        Ok(())
    }

    pub fn update_column(
        &mut self,
        partition: Partition,
        id: &str,
        overrides: &ColumnOverrides,
    ) -> Result<()> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| unknown(id, partition))?;
        column.apply(overrides);
        Ok(())
    }
}

fn unknown(id: &str, partition: Partition) -> Error {
    Error::UnknownParameter {
        id: id.to_string(),
        partition,
    }
}
