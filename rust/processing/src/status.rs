// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Processing status of a partition.

use serde::{Deserialize, Serialize};

/// `Idle → Processing → (Complete | Error)`. `Error` is not terminal: the
/// next successful pass moves back to `Complete`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Idle,
    Processing,
    Complete,
    Error,
}

impl ProcessingStatus {
    pub fn begin(self) -> Self {
        ProcessingStatus::Processing
    }

    /// Leaves `Processing` with the outcome of the pass. Other states are
    /// returned unchanged.
    pub fn finish(self, ok: bool) -> Self {
        match (self, ok) {
            (ProcessingStatus::Processing, true) => ProcessingStatus::Complete,
            (ProcessingStatus::Processing, false) => ProcessingStatus::Error,
            (other, _) => other,
        }
    }

    pub fn is_processing(self) -> bool {
        self == ProcessingStatus::Processing
    }

    pub fn is_error(self) -> bool {
        self == ProcessingStatus::Error
    }
}
