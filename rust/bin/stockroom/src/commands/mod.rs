pub mod category;
pub mod context;
pub mod diff;
pub mod product;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Map, Value};
use stockroom_catalog::{Allocator, CategoryStore, ProductRepository};
use stockroom_kv::{KVStore, RedbStore};
use tracing::debug;

use crate::config::ClientConfig;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Output {
    Table,
    Json,
}

/// Handles on the local replica.
pub struct Stores {
    pub products: ProductRepository,
    pub categories: CategoryStore,
}

/// Open the redb replica named by the config (or `--db`).
pub fn open_stores(config: &ClientConfig, db_override: Option<&Path>) -> Result<Stores> {
    config.validate()?;
    let path = config.resolve_db_path(db_override);
    debug!("opening local store {}", path.display());

    let kv: Arc<dyn KVStore> = Arc::new(
        RedbStore::open(&path)
            .map_err(|e| anyhow::anyhow!("failed to open local store {}: {}", path.display(), e))?,
    );
    let allocator = Allocator::with_floor(config.store.offline_floor);

    Ok(Stores {
        products: ProductRepository::with_allocator(Arc::clone(&kv), allocator),
        categories: CategoryStore::new(kv),
    })
}

/// JSON body from `--json` or `-f <file>`.
pub fn read_body(json_body: Option<String>, file: Option<String>) -> Result<Value> {
    let raw = if let Some(path) = file {
        std::fs::read_to_string(&path)?
    } else if let Some(json) = json_body {
        json
    } else {
        anyhow::bail!("Provide --json or -f <file>.");
    };
    serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line rendering of a field map for table output.
pub fn compact(fields: &Map<String, Value>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}
