// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration loaded from environment variables.

use std::time::Duration;

use schedule_lite_core::CategoryConfig;

/// Version stamp written into cache entries. Entries from another version
/// are discarded on load.
pub const PIPELINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Categories whose elements become parent rows.
    pub parent_categories: Vec<String>,
    /// Categories whose elements become child rows.
    pub child_categories: Vec<String>,
    /// Quiet window for coalescing model and category triggers.
    pub debounce_ms: u64,
    /// Maximum age of a cache entry in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum size of a cache entry in bytes.
    pub cache_max_bytes: usize,
    /// Directory for the disk cache backend.
    pub cache_dir: String,
    /// Fixed storage key of the cache entry.
    pub cache_key: String,
}

impl PipelineConfig {
    /// Load configuration from environment variables. Unset or unparsable
    /// variables keep the [`Default`] value.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            parent_categories: list_var("SCHEDULE_PARENT_CATEGORIES"),
            child_categories: list_var("SCHEDULE_CHILD_CATEGORIES"),
            debounce_ms: std::env::var("SCHEDULE_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.debounce_ms),
            cache_ttl_secs: std::env::var("SCHEDULE_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl_secs),
            cache_max_bytes: std::env::var("SCHEDULE_CACHE_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_max_bytes),
            cache_dir: std::env::var("SCHEDULE_CACHE_DIR").unwrap_or(defaults.cache_dir),
            cache_key: std::env::var("SCHEDULE_CACHE_KEY").unwrap_or(defaults.cache_key),
        }
    }

    pub fn categories(&self) -> CategoryConfig {
        CategoryConfig::new(self.parent_categories.clone(), self.child_categories.clone())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parent_categories: Vec::new(),
            child_categories: Vec::new(),
            debounce_ms: 300,
            cache_ttl_secs: 300,
            cache_max_bytes: 5 * 1024 * 1024,
            cache_dir: "./.cache".into(),
            cache_key: "schedule-lite:raw-parameters".into(),
        }
    }
}

fn list_var(name: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
