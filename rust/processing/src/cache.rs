// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Versioned cache of the last extracted raw-parameter set.
//!
//! One entry lives under a fixed key:
//! `{ data: RawParameter[], timestamp (ms epoch), version, size (bytes) }`.
//! An entry that fails to parse, carries another version, is older than the
//! TTL or larger than the ceiling is treated as absent. Storage failures are
//! logged and degrade to a miss; they never reach the caller.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use schedule_lite_core::RawParameter;
use serde::{Deserialize, Serialize};

use crate::config::{PipelineConfig, PIPELINE_VERSION};
use crate::error::{Error, Result};

/// Key-value byte storage the cache is written to.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, data: &[u8]) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-process storage, optionally with a quota to mimic browser storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<FxHashMap<String, Vec<u8>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes larger than `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota: Some(quota),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, FxHashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Cache("memory storage lock poisoned".into()))
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, data: &[u8]) -> Result<()> {
        if let Some(quota) = self.quota {
            if data.len() > quota {
                return Err(Error::Cache(format!(
                    "quota exceeded: {} bytes over a {} byte quota",
                    data.len(),
                    quota
                )));
            }
        }
        self.lock()?.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Content-addressable disk storage using cacache.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    cache_dir: PathBuf,
}

impl DiskStorage {
    /// Create a storage in the specified directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let path = cache_dir.into();

        if let Err(e) = std::fs::create_dir_all(&path) {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to create cache directory"
            );
        }

        Self { cache_dir: path }
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match cacache::read(&self.cache_dir, key).await {
            Ok(data) => Ok(Some(data)),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(e) => Err(Error::Cache(e.to_string())),
        }
    }

    async fn set(&self, key: &str, data: &[u8]) -> Result<()> {
        cacache::write(&self.cache_dir, key, data).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        cacache::remove(&self.cache_dir, key).await?;
        Ok(())
    }
}

/// The persisted entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Vec<RawParameter>,
    pub timestamp: u64,
    pub version: String,
    pub size: usize,
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Cache of the last successful raw-parameter set.
pub struct ParameterCache {
    storage: Box<dyn CacheStorage>,
    key: String,
    ttl: Duration,
    max_bytes: usize,
    version: String,
}

impl ParameterCache {
    pub fn new(storage: Box<dyn CacheStorage>, config: &PipelineConfig) -> Self {
        Self {
            storage,
            key: config.cache_key.clone(),
            ttl: config.cache_ttl(),
            max_bytes: config.cache_max_bytes,
            version: PIPELINE_VERSION.to_string(),
        }
    }

    /// Loads the cached raw set if present and valid now.
    pub async fn load(&self) -> Option<Vec<RawParameter>> {
        self.load_at(now_ms()).await
    }

    /// Loads the cached raw set if present and valid at `now` (ms epoch).
    pub async fn load_at(&self, now: u64) -> Option<Vec<RawParameter>> {
        let bytes = match self.storage.get(&self.key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!(key = %self.key, "Cache MISS");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Corrupt cache entry, discarding");
                self.discard().await;
                return None;
            }
        };

        if entry.version != self.version {
            tracing::info!(
                key = %self.key,
                cached = %entry.version,
                current = %self.version,
                "Cache version mismatch, discarding"
            );
            self.discard().await;
            return None;
        }
        let age_ms = now.saturating_sub(entry.timestamp);
        if age_ms > self.ttl.as_millis() as u64 {
            tracing::debug!(key = %self.key, age_ms, "Cache entry expired");
            return None;
        }
        if entry.size > self.max_bytes {
            tracing::warn!(key = %self.key, size = entry.size, max = self.max_bytes, "Cache entry too large");
            return None;
        }

        tracing::info!(key = %self.key, parameters = entry.data.len(), "Cache HIT");
        Some(entry.data)
    }

    /// Stores a raw set. Returns false when the write was skipped or failed.
    pub async fn save(&self, data: &[RawParameter]) -> bool {
        self.save_at(data, now_ms()).await
    }

    pub async fn save_at(&self, data: &[RawParameter], now: u64) -> bool {
        let size = match serde_json::to_vec(data) {
            Ok(bytes) => bytes.len(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize parameters for cache");
                return false;
            }
        };
        if size > self.max_bytes {
            tracing::warn!(size, max = self.max_bytes, "Parameter set exceeds cache ceiling, skipping write");
            return false;
        }

        let entry = CacheEntry {
            data: data.to_vec(),
            timestamp: now,
            version: self.version.clone(),
            size,
        };
        let result = match serde_json::to_vec(&entry) {
            Ok(bytes) => self.storage.set(&self.key, &bytes).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => {
                tracing::debug!(key = %self.key, size, parameters = data.len(), "Cached parameters");
                true
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Cache write failed");
                false
            }
        }
    }

    /// Removes the entry. Failures are logged only.
    pub async fn clear(&self) {
        self.discard().await;
    }

    async fn discard(&self) {
        if let Err(e) = self.storage.remove(&self.key).await {
            tracing::warn!(key = %self.key, error = %e, "Failed to remove cache entry");
        }
    }
}

impl std::fmt::Debug for ParameterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterCache")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .field("max_bytes", &self.max_bytes)
            .field("version", &self.version)
            .finish()
    }
}
