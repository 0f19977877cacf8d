// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schedule-Lite CLI - builds schedule columns from a BIM element dump.
//!
//! Reads a JSON array of elements (or `{"elements": [...]}`), runs one pass
//! and prints the resulting partitions as JSON or as plain-text tables.
//!
//! ```text
//! schedule-lite model.json --parent Walls --child Windows --format table
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use schedule_lite_core::Partition;
use schedule_lite_processing::{
    CacheStorage, DiskStorage, MemoryStorage, ParameterStore, PipelineConfig,
};

mod input;
mod output;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Table,
}

#[derive(Parser)]
#[command(name = "schedule-lite")]
#[command(about = "Build schedule columns from a BIM element dump")]
struct Args {
    /// Path to the element dump (JSON)
    file: PathBuf,

    /// Parent category; repeat for more. Overrides SCHEDULE_PARENT_CATEGORIES
    #[arg(long = "parent")]
    parents: Vec<String>,

    /// Child category; repeat for more. Overrides SCHEDULE_CHILD_CATEGORIES
    #[arg(long = "child")]
    children: Vec<String>,

    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    /// Persist the raw set in the disk cache and recover from it on failure
    #[arg(long)]
    use_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,schedule_lite_processing=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = PipelineConfig::from_env();
    if !args.parents.is_empty() || !args.children.is_empty() {
        config.parent_categories = args.parents.clone();
        config.child_categories = args.children.clone();
    }

    tracing::info!(
        file = %args.file.display(),
        parents = ?config.parent_categories,
        children = ?config.child_categories,
        use_cache = args.use_cache,
        "Starting Schedule-Lite"
    );

    let elements = input::read_elements(&args.file)?;
    let storage: Box<dyn CacheStorage> = if args.use_cache {
        Box::new(DiskStorage::new(&config.cache_dir))
    } else {
        Box::new(MemoryStorage::new())
    };
    let store = ParameterStore::new(&config, storage);

    if let Err(e) = store.extract_and_process(elements).await {
        let snapshot = store.snapshot();
        match snapshot.recovered_from {
            Some(source) => tracing::warn!(error = %e, ?source, "Pass failed, printing recovered parameters"),
            None => return Err(e.into()),
        }
    }

    let snapshot = store.snapshot();
    output::log_diagnostics(&snapshot.diagnostics);

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&*snapshot)?),
        Format::Table => {
            for partition in Partition::ALL {
                let table = output::render_table(&snapshot, partition);
                if !table.is_empty() {
                    println!("{}", table);
                }
            }
        }
    }
    Ok(())
}
