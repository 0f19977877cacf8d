// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Schedule-Lite Processing
//!
//! Stateful layer on top of [`schedule_lite_core`]: an owned
//! [`ParameterStore`] with per-partition status, a versioned cache of the
//! last raw set, recovery after failed passes and a debounced
//! [`ExtractionScheduler`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use schedule_lite_core::Element;
//! use schedule_lite_processing::{ExtractionScheduler, ParameterStore, PipelineConfig};
//!
//! # async fn demo() {
//! let config = PipelineConfig::from_env();
//! let store = Arc::new(ParameterStore::with_memory_cache(&config));
//! let mut updates = store.subscribe();
//!
//! let scheduler = ExtractionScheduler::spawn(store.clone(), config.debounce());
//! scheduler.model_changed(vec![Element::new("wall1", "Walls").with_parameter("Mark", "W1")]);
//!
//! updates.changed().await.ok();
//! println!("{} columns", updates.borrow().parent.data.columns.len());
//! scheduler.shutdown().await;
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod recovery;
pub mod scheduler;
pub mod status;
pub mod store;

pub use cache::{CacheEntry, CacheStorage, DiskStorage, MemoryStorage, ParameterCache};
pub use config::{PipelineConfig, PIPELINE_VERSION};
pub use error::{Error, Result};
pub use recovery::{minimal_raw_parameters, recover, Recovered, RecoverySource};
pub use scheduler::{ExtractionScheduler, Trigger};
pub use status::ProcessingStatus;
pub use store::{ParameterStore, PartitionView, StoreSnapshot};
