// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for parameter processing.

use crate::element::Partition;

/// Result type alias for parameter processing.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an operation. Per-key problems are reported as
/// [`ExtractionIssue`](crate::diagnostics::ExtractionIssue)s instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// None of the input elements carries a single parameter.
    #[error("no elements with parameters to extract")]
    NoParameters,

    /// Every parameter in the batch had to be degraded.
    #[error("all {failed} parameters failed to process")]
    AllParametersFailed { failed: usize },

    /// The id does not name a selected parameter in the partition.
    #[error("unknown parameter '{id}' in {partition} partition")]
    UnknownParameter { id: String, partition: Partition },

    /// Model-discovered parameters cannot be removed.
    #[error("parameter '{id}' is model-sourced and cannot be removed")]
    NotRemovable { id: String },

    /// A parameter with the same normalized name already exists.
    #[error("a parameter named '{name}' already exists in {partition} partition")]
    DuplicateParameter { name: String, partition: Partition },

    /// User parameter names must contain a visible character.
    #[error("parameter name must not be empty")]
    InvalidName,

    /// Only user-created parameters accept manually entered values.
    #[error("parameter '{id}' is model-sourced and its value cannot be edited")]
    ReadOnlyValue { id: String },
}
