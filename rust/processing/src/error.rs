// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the parameter store.

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the store and its cache layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An extraction pass is already running; retry after it completes.
    #[error("an extraction pass is already in progress")]
    Busy,

    /// The pass itself failed.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] schedule_lite_core::Error),

    /// Storage backend failure.
    #[error("cache error: {0}")]
    Cache(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<cacache::Error> for Error {
    fn from(err: cacache::Error) -> Self {
        Error::Cache(err.to_string())
    }
}
