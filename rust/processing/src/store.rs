// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The owned parameter store.
//!
//! [`ParameterStore`] holds both partitions, the last input elements and
//! the active category configuration. Readers never touch the state
//! directly: every mutation publishes an immutable [`StoreSnapshot`] on a
//! `watch` channel, and [`ParameterStore::snapshot`] returns the latest one.
//!
//! A pass is a sequence of steps separated by yield points. Only one pass
//! runs at a time; a second call while one is in flight returns
//! [`Error::Busy`], as do cache loads and resets. The state lock is never
//! held across an await, cache I/O included.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use schedule_lite_core::{
    assign_roles, extract, CategoryConfig, ColumnOverrides, Diagnostics, Element,
    ElementAssignment, ParamValue, Partition, PartitionData, RawParameter, ValueKind,
};
use serde::Serialize;
use tokio::sync::watch;

use crate::cache::{now_ms, CacheStorage, MemoryStorage, ParameterCache};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::recovery::{recover, RecoverySource};
use crate::status::ProcessingStatus;

/// Read-only view of one partition.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionView {
    #[serde(flatten)]
    pub data: PartitionData,
    pub status: ProcessingStatus,
}

/// Immutable state published after every mutation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub parent: PartitionView,
    pub child: PartitionView,
    pub categories: CategoryConfig,
    pub is_processing: bool,
    pub has_error: bool,
    pub last_error: Option<String>,
    /// Milliseconds since the Unix epoch of the last state change.
    pub last_updated: Option<u64>,
    pub diagnostics: Diagnostics,
    pub hierarchy: Vec<ElementAssignment>,
    /// Number of passes that completed successfully.
    pub passes: u64,
    /// Set when the partitions were rebuilt after a failed pass.
    pub recovered_from: Option<RecoverySource>,
}

impl StoreSnapshot {
    pub fn partition(&self, partition: Partition) -> &PartitionView {
        match partition {
            Partition::Parent => &self.parent,
            Partition::Child => &self.child,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    categories: CategoryConfig,
    elements: Vec<Element>,
    parent: PartitionData,
    child: PartitionData,
    parent_status: ProcessingStatus,
    child_status: ProcessingStatus,
    last_error: Option<String>,
    last_updated: Option<u64>,
    diagnostics: Diagnostics,
    hierarchy: Vec<ElementAssignment>,
    recovered_from: Option<RecoverySource>,
}

impl StoreState {
    fn partition_mut(&mut self, partition: Partition) -> &mut PartitionData {
        match partition {
            Partition::Parent => &mut self.parent,
            Partition::Child => &mut self.child,
        }
    }

    fn set_status(&mut self, f: impl Fn(ProcessingStatus) -> ProcessingStatus) {
        self.parent_status = f(self.parent_status);
        self.child_status = f(self.child_status);
    }

    fn touch(&mut self) {
        self.last_updated = Some(now_ms());
    }

    /// Replaces both partitions from a raw set, keeping user customizations.
    fn apply_raw(&mut self, raw: Vec<RawParameter>) {
        let (parent, child): (Vec<_>, Vec<_>) =
            raw.into_iter().partition(|p| p.partition() == Partition::Parent);
        self.parent = self.parent.derive(parent);
        self.child = self.child.derive(child);
    }
}

/// Clears the processing flag when a pass ends, however it ends.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owned store of both schedule partitions.
pub struct ParameterStore {
    state: Mutex<StoreState>,
    processing: AtomicBool,
    passes: AtomicU64,
    cache: ParameterCache,
    tx: watch::Sender<Arc<StoreSnapshot>>,
}

impl ParameterStore {
    pub fn new(config: &PipelineConfig, storage: Box<dyn CacheStorage>) -> Self {
        let state = StoreState {
            categories: config.categories(),
            ..Default::default()
        };
        let (tx, _) = watch::channel(Arc::new(StoreSnapshot {
            categories: state.categories.clone(),
            ..Default::default()
        }));
        Self {
            state: Mutex::new(state),
            processing: AtomicBool::new(false),
            passes: AtomicU64::new(0),
            cache: ParameterCache::new(storage, config),
            tx,
        }
    }

    /// Store backed by an in-memory cache.
    pub fn with_memory_cache(config: &PipelineConfig) -> Self {
        Self::new(config, Box::new(MemoryStorage::new()))
    }

    /// Receiver that yields every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    pub fn categories(&self) -> CategoryConfig {
        self.lock().categories.clone()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self) {
        let snapshot = {
            let state = self.lock();
            StoreSnapshot {
                parent: PartitionView {
                    data: state.parent.clone(),
                    status: state.parent_status,
                },
                child: PartitionView {
                    data: state.child.clone(),
                    status: state.child_status,
                },
                categories: state.categories.clone(),
                is_processing: self.is_processing(),
                has_error: state.parent_status.is_error() || state.child_status.is_error(),
                last_error: state.last_error.clone(),
                last_updated: state.last_updated,
                diagnostics: state.diagnostics.clone(),
                hierarchy: state.hierarchy.clone(),
                passes: self.passes.load(Ordering::Relaxed),
                recovered_from: state.recovered_from,
            }
        };
        self.tx.send_replace(Arc::new(snapshot));
    }

    fn begin(&self) -> Result<ProcessingGuard<'_>> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Store operation rejected while a pass is running");
            return Err(Error::Busy);
        }
        Ok(ProcessingGuard(&self.processing))
    }

    /// Runs a full pass over `elements` and replaces both partitions.
    ///
    /// On failure the error is stored and returned, both statuses move to
    /// `error` and the previous partitions are kept. If there were none, the
    /// partitions are rebuilt from the cache or a minimal identity set.
    pub async fn extract_and_process(&self, elements: Vec<Element>) -> Result<()> {
        let guard = self.begin()?;
        let categories = {
            let mut state = self.lock();
            state.elements = elements.clone();
            state.set_status(ProcessingStatus::begin);
            state.categories.clone()
        };
        self.publish();
        tracing::info!(elements = elements.len(), "Starting extraction pass");

        tokio::task::yield_now().await;
        let extraction = match extract(&elements, &categories) {
            Ok(extraction) => extraction,
            Err(e) => {
                self.fail(&e.to_string(), &elements, &categories).await;
                drop(guard);
                self.publish();
                return Err(e.into());
            }
        };

        tokio::task::yield_now().await;
        {
            let mut state = self.lock();
            state.parent = state.parent.derive(extraction.parent);
        }

        tokio::task::yield_now().await;
        {
            let mut state = self.lock();
            state.child = state.child.derive(extraction.child);
        }

        tokio::task::yield_now().await;
        let (parent, child) = {
            let mut state = self.lock();
            state.hierarchy = extraction.hierarchy;
            state.diagnostics = extraction.diagnostics;
            state.last_error = None;
            state.recovered_from = None;
            state.set_status(|s| s.finish(true));
            state.touch();
            (state.parent.selected.len(), state.child.selected.len())
        };
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.save_to_cache().await;

        drop(guard);
        self.publish();
        tracing::info!(parent, child, "Extraction pass complete");
        Ok(())
    }

    async fn fail(&self, message: &str, elements: &[Element], categories: &CategoryConfig) {
        tracing::warn!(error = %message, "Extraction pass failed");
        let was_empty = {
            let mut state = self.lock();
            state.set_status(|s| s.finish(false));
            state.last_error = Some(message.to_string());
            state.touch();
            state.parent.is_empty() && state.child.is_empty()
        };
        if !was_empty {
            return;
        }

        let recovered = recover(&self.cache, elements, categories).await;
        if recovered.is_empty() {
            return;
        }
        let mut state = self.lock();
        state.parent = state.parent.derive(recovered.parent);
        state.child = state.child.derive(recovered.child);
        state.recovered_from = Some(recovered.source);
        state.hierarchy = assign_roles(elements, categories);
    }

    /// Replaces the category configuration and re-runs the pass over the
    /// last elements.
    pub async fn update_categories(&self, parents: Vec<String>, children: Vec<String>) -> Result<()> {
        if self.is_processing() {
            tracing::warn!("Category update rejected while a pass is running");
            return Err(Error::Busy);
        }
        let elements = {
            let mut state = self.lock();
            state.categories = CategoryConfig::new(parents, children);
            state.elements.clone()
        };
        if elements.is_empty() {
            self.publish();
            return Ok(());
        }
        self.extract_and_process(elements).await
    }

    /// Replaces the category configuration without running a pass.
    pub fn set_categories(&self, parents: Vec<String>, children: Vec<String>) {
        self.lock().categories = CategoryConfig::new(parents, children);
        self.publish();
    }

    /// Elements of the last pass.
    pub fn elements(&self) -> Vec<Element> {
        self.lock().elements.clone()
    }

    fn mutate<T>(
        &self,
        partition: Partition,
        f: impl FnOnce(&mut PartitionData) -> schedule_lite_core::Result<T>,
    ) -> Result<T> {
        let result = {
            let mut state = self.lock();
            let result = f(state.partition_mut(partition))?;
            state.touch();
            result
        };
        self.publish();
        Ok(result)
    }

    /// Adds a user parameter and returns its id.
    pub fn add_user_parameter(
        &self,
        partition: Partition,
        name: &str,
        value_type: ValueKind,
        group: &str,
        initial: ParamValue,
    ) -> Result<String> {
        let id = self.mutate(partition, |data| {
            data.add_user_parameter(partition, name, value_type, group, initial)
        })?;
        tracing::debug!(%partition, id = %id, "Added user parameter");
        Ok(id)
    }

    pub fn remove_parameter(&self, partition: Partition, id: &str) -> Result<()> {
        self.mutate(partition, |data| data.remove_parameter(partition, id))
    }

    pub fn update_parameter_visibility(&self, id: &str, visible: bool, partition: Partition) -> Result<()> {
        self.mutate(partition, |data| data.set_visibility(partition, id, visible))
    }

    pub fn update_parameter_order(&self, id: &str, new_order: usize, partition: Partition) -> Result<()> {
        self.mutate(partition, |data| data.set_order(partition, id, new_order))
    }

    pub fn update_column(&self, partition: Partition, id: &str, overrides: &ColumnOverrides) -> Result<()> {
        self.mutate(partition, |data| data.update_column(partition, id, overrides))
    }

    pub fn set_user_parameter_value(&self, partition: Partition, id: &str, value: ParamValue) -> Result<()> {
        self.mutate(partition, |data| data.set_user_value(partition, id, value))
    }

    /// Rebuilds both partitions from a valid cache entry. Returns false on a
    /// miss and [`Error::Busy`] while a pass is running.
    pub async fn load_from_cache(&self) -> Result<bool> {
        let guard = self.begin()?;
        let Some(raw) = self.cache.load().await else {
            return Ok(false);
        };
        {
            let mut state = self.lock();
            state.apply_raw(raw);
            state.set_status(|_| ProcessingStatus::Complete);
            state.last_error = None;
            state.touch();
        }
        drop(guard);
        self.publish();
        Ok(true)
    }

    /// Writes the raw parameters of both partitions. Returns false when the
    /// write was skipped or failed.
    pub async fn save_to_cache(&self) -> bool {
        let raw: Vec<RawParameter> = {
            let state = self.lock();
            state.parent.raw.iter().chain(&state.child.raw).cloned().collect()
        };
        self.cache.save(&raw).await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Drops all state except the category configuration. Returns
    /// [`Error::Busy`] while a pass is running.
    pub fn reset(&self) -> Result<()> {
        let guard = self.begin()?;
        {
            let mut state = self.lock();
            let categories = std::mem::take(&mut state.categories);
            *state = StoreState {
                categories,
                ..Default::default()
            };
        }
        self.passes.store(0, Ordering::Relaxed);
        drop(guard);
        self.publish();
        tracing::debug!("Parameter store reset");
        Ok(())
    }
}

impl std::fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStore")
            .field("processing", &self.is_processing())
            .field("passes", &self.passes.load(Ordering::Relaxed))
            .field("cache", &self.cache)
            .finish()
    }
}
