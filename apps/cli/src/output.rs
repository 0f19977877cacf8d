// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plain-text schedule rendering.

use std::fmt::Write;

use schedule_lite_core::{normalize_name, Diagnostics, ParameterKind, Partition};
use schedule_lite_processing::StoreSnapshot;

/// Logs every extraction issue and returns how many there were.
pub fn log_diagnostics(diagnostics: &Diagnostics) -> usize {
    if diagnostics.is_clean() {
        tracing::debug!(parameters = diagnostics.stats.parameters, "Extraction produced no issues");
        return 0;
    }
    for issue in &diagnostics.issues {
        tracing::warn!(
            element = issue.element_id.as_deref().unwrap_or("-"),
            key = %issue.key,
            kind = ?issue.kind,
            "{}",
            issue.message
        );
    }
    diagnostics.issues.len()
}

/// One row per element of the partition, one cell per visible column.
pub fn render_table(snapshot: &StoreSnapshot, partition: Partition) -> String {
    let view = snapshot.partition(partition);
    let columns: Vec<_> = view.data.columns.iter().filter(|c| c.visible).collect();
    let mut out = String::new();
    if columns.is_empty() {
        return out;
    }

    let element_ids: Vec<&str> = snapshot
        .hierarchy
        .iter()
        .filter(|a| a.role.partition() == Some(partition))
        .map(|a| a.element_id.as_str())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(element_ids.len() + 1);
    rows.push(columns.iter().map(|c| c.header.clone()).collect());
    for element_id in &element_ids {
        let row = columns
            .iter()
            .map(|column| {
                let user = view
                    .data
                    .selected
                    .iter()
                    .find(|p| p.id == column.id && p.kind == ParameterKind::User);
                if let Some(param) = user {
                    return param.value.render();
                }
                let name = normalize_name(&column.name);
                view.data
                    .raw
                    .iter()
                    .find(|p| {
                        p.metadata.element_id.as_deref() == Some(*element_id)
                            && normalize_name(&p.name) == name
                    })
                    .map(|p| p.value.render())
                    .unwrap_or_default()
            })
            .collect();
        rows.push(row);
    }

    let widths: Vec<usize> = (0..columns.len())
        .map(|i| rows.iter().map(|r| r[i].chars().count()).max().unwrap_or(0))
        .collect();

    let _ = writeln!(out, "{} ({} rows)", partition, element_ids.len());
    for (i, row) in rows.iter().enumerate() {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        let _ = writeln!(out, "{}", line.join(" | ").trim_end());
        if i == 0 {
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            let _ = writeln!(out, "{}", rule.join("-+-"));
        }
    }
    out
}
