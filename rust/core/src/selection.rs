// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection reconciliation.
//!
//! The selection is the user-facing ordered list of parameters. Every pass
//! rebuilds it from the fresh available set while keeping what the user
//! decided: entries that survive keep `visible` and `order`, new entries are
//! appended visible, vanished entries are dropped. `order` is renumbered to
//! `0..n` after every change.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::available::{AvailableParameter, AvailableSet};
use crate::value::{ParamValue, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Bim,
    User,
}

/// A parameter chosen for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedParameter {
    pub id: String,
    pub name: String,
    pub kind: ParameterKind,
    #[serde(rename = "type")]
    pub value_type: ValueKind,
    pub value: ParamValue,
    pub group: String,
    pub visible: bool,
    pub order: usize,
}

impl SelectedParameter {
    fn from_available(param: &AvailableParameter, order: usize) -> Self {
        match param {
            AvailableParameter::Bim(p) => Self {
                id: p.id.clone(),
                name: p.name.clone(),
                kind: ParameterKind::Bim,
                value_type: p.value_type,
                value: p.value.clone(),
                group: p.current_group.clone(),
                visible: p.visible,
                order,
            },
            AvailableParameter::User(p) => Self {
                id: p.id.clone(),
                name: p.name.clone(),
                kind: ParameterKind::User,
                value_type: p.value_type,
                value: p.value.clone(),
                group: p.group.clone(),
                visible: p.visible,
                order,
            },
        }
    }

    pub fn is_removable(&self) -> bool {
        self.kind == ParameterKind::User
    }
}

/// Reconciles a fresh available set with the previous selection.
///
/// Idempotent: feeding the result back as `previous` with the same
/// available set returns it unchanged.
pub fn reconcile_selection(
    available: &AvailableSet,
    previous: &[SelectedParameter],
) -> Vec<SelectedParameter> {
    let mut candidates: Vec<AvailableParameter> = available.iter().collect();
    candidates.sort_by(|a, b| (a.group(), a.name()).cmp(&(b.group(), b.name())));

    let previous_by_id: FxHashMap<&str, &SelectedParameter> =
        previous.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut next_order = candidates
        .iter()
        .filter_map(|c| previous_by_id.get(c.id()))
        .map(|p| p.order + 1)
        .max()
        .unwrap_or(0);

    let mut selection: Vec<SelectedParameter> = candidates
        .iter()
        .map(|candidate| match previous_by_id.get(candidate.id()) {
            Some(existing) => {
                let mut fresh = SelectedParameter::from_available(candidate, existing.order);
                fresh.visible = existing.visible;
                fresh
            }
            None => {
                let mut fresh = SelectedParameter::from_available(candidate, next_order);
                fresh.visible = true;
                next_order += 1;
                fresh
            }
        })
        .collect();

    renumber(&mut selection);

    let survivors = candidates
        .iter()
        .filter(|c| previous_by_id.contains_key(c.id()))
        .count();
    tracing::debug!(
        available = available.len(),
        selected = selection.len(),
        added = selection.len() - survivors,
        dropped = previous.len() - survivors,
        "Reconciled selection"
    );
    selection
}

/// Sorts by `order` (stable) and reassigns contiguous orders from zero.
pub fn renumber(selection: &mut [SelectedParameter]) {
    selection.sort_by_key(|p| p.order);
    for (i, param) in selection.iter_mut().enumerate() {
        param.order = i;
    }
}

/// Moves a parameter to `new_order`, clamped to the end of the list.
/// Returns false if the id is not selected.
pub fn move_parameter(selection: &mut Vec<SelectedParameter>, id: &str, new_order: usize) -> bool {
    renumber(selection);
    let Some(position) = selection.iter().position(|p| p.id == id) else {
        return false;
    };
    let param = selection.remove(position);
    let target = new_order.min(selection.len());
    selection.insert(target, param);
    for (i, param) in selection.iter_mut().enumerate() {
        param.order = i;
    }
    true
}

/// Sets visibility of one parameter. Returns false if the id is not selected.
pub fn set_visibility(selection: &mut [SelectedParameter], id: &str, visible: bool) -> bool {
    match selection.iter_mut().find(|p| p.id == id) {
        Some(param) => {
            param.visible = visible;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::available::{AvailableBimParameter, AvailableUserParameter, BimMetadata};
    use crate::classify::BimOrigin;

    fn bim(id: &str, group: &str, value: ParamValue) -> AvailableBimParameter {
        AvailableBimParameter {
            id: id.to_string(),
            name: id.to_string(),
            value_type: value.kind(),
            value,
            source_group: group.to_string(),
            current_group: group.to_string(),
            visible: true,
            metadata: BimMetadata {
                origin: BimOrigin::Extraction,
                categories: vec![],
                occurrences: 1,
                is_nested: false,
                parent_key: None,
            },
        }
    }

    fn set(params: Vec<AvailableBimParameter>) -> AvailableSet {
        AvailableSet {
            bim: params,
            user: vec![],
        }
    }

    fn selected(id: &str, visible: bool, order: usize) -> SelectedParameter {
        SelectedParameter {
            id: id.to_string(),
            name: id.to_string(),
            kind: ParameterKind::Bim,
            value_type: ValueKind::String,
            value: ParamValue::from("old"),
            group: "Parameters".to_string(),
            visible,
            order,
        }
    }

    #[test]
    fn fresh_selection_is_sorted_and_visible() {
        let available = set(vec![
            bim("Width", "Dimensions", ParamValue::Number(1.0)),
            bim("Mark", "Identity Data", "W1".into()),
            bim("Height", "Dimensions", ParamValue::Number(2.0)),
        ]);
        let selection = reconcile_selection(&available, &[]);
        let ids: Vec<&str> = selection.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["Height", "Width", "Mark"]);
        assert!(selection.iter().all(|p| p.visible));
        assert_eq!(selection.iter().map(|p| p.order).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn overrides_survive_with_fresh_value() {
        let available = set(vec![
            bim("p0", "Parameters", "a".into()),
            bim("p1", "Parameters", "new".into()),
        ]);
        let previous = vec![selected("p0", true, 0), selected("p1", false, 1)];
        let selection = reconcile_selection(&available, &previous);
        let p1 = selection.iter().find(|p| p.id == "p1").unwrap();
        assert!(!p1.visible);
        assert_eq!(p1.order, 1);
        assert_eq!(p1.value, ParamValue::String("new".into()));
    }

    #[test]
    fn appends_new_and_drops_vanished() {
        let available = set(vec![
            bim("p1", "Parameters", "a".into()),
            bim("p2", "Parameters", "b".into()),
        ]);
        let first = reconcile_selection(&available, &[selected("p1", true, 0)]);
        assert_eq!(
            first.iter().map(|p| (p.id.as_str(), p.order)).collect::<Vec<_>>(),
            vec![("p1", 0), ("p2", 1)]
        );

        let available = set(vec![bim("p2", "Parameters", "b".into())]);
        let second = reconcile_selection(&available, &first);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, "p2");
        assert_eq!(second[0].order, 0);
    }

    #[test]
    fn user_order_beats_alphabetical_order() {
        let available = set(vec![
            bim("a", "Parameters", "1".into()),
            bim("b", "Parameters", "2".into()),
            bim("c", "Parameters", "3".into()),
        ]);
        let previous = vec![selected("c", true, 0), selected("a", true, 1), selected("b", true, 2)];
        let selection = reconcile_selection(&available, &previous);
        let ids: Vec<&str> = selection.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn reconciliation_is_idempotent() {
        let mut available = set(vec![
            bim("Height", "Dimensions", ParamValue::Number(1.0)),
            bim("Mark", "Identity Data", "W1".into()),
        ]);
        available.user.push(
            AvailableUserParameter::new("Cost", ValueKind::Number, "Budget", ParamValue::Number(5.0)).unwrap(),
        );
        let once = reconcile_selection(&available, &[selected("Mark", false, 0)]);
        let twice = reconcile_selection(&available, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn move_renumbers_contiguously() {
        let mut selection = vec![selected("a", true, 0), selected("b", true, 1), selected("c", true, 2)];
        assert!(move_parameter(&mut selection, "c", 0));
        let ids: Vec<(&str, usize)> = selection.iter().map(|p| (p.id.as_str(), p.order)).collect();
        assert_eq!(ids, vec![("c", 0), ("a", 1), ("b", 2)]);

        assert!(move_parameter(&mut selection, "c", 99));
        assert_eq!(selection.last().unwrap().id, "c");
        assert_eq!(selection.last().unwrap().order, 2);

        assert!(!move_parameter(&mut selection, "missing", 0));
    }

    #[test]
    fn visibility_toggle() {
        let mut selection = vec![selected("a", true, 0)];
        assert!(set_visibility(&mut selection, "a", false));
        assert!(!selection[0].visible);
        assert!(!set_visibility(&mut selection, "zzz", false));
    }
}
