// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element dump parsing.

use std::path::Path;

use anyhow::Context;
use schedule_lite_core::Element;
use serde::Deserialize;

/// Accepted dump shapes: a bare array or an object with an `elements` array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ElementDump {
    List(Vec<Element>),
    Wrapped { elements: Vec<Element> },
}

pub fn parse_elements(json: &str) -> anyhow::Result<Vec<Element>> {
    let dump: ElementDump = serde_json::from_str(json).context("Invalid element dump")?;
    Ok(match dump {
        ElementDump::List(elements) | ElementDump::Wrapped { elements } => elements,
    })
}

pub fn read_elements(path: &Path) -> anyhow::Result<Vec<Element>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_elements(&json).with_context(|| format!("Failed to parse {}", path.display()))
}
