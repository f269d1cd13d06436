//! Offline product catalog.
//!
//! Keeps a local replica of product records in a [`stockroom_kv::KVStore`],
//! hands out collision-safe codes to products created offline, and compares
//! the replica with the remote catalog once connectivity returns.

pub mod allocator;
pub mod category;
pub mod error;
pub mod product;
pub mod reconcile;
pub mod remote;
pub mod repository;

pub use allocator::{allocate, Allocator, OFFLINE_CODE_FLOOR};
pub use category::{Category, CategoryStore};
pub use error::{CatalogError, Operation, Side};
pub use product::{Code, Product};
pub use reconcile::{diff, DiffSummary, Difference, FieldDelta};
pub use remote::{RemoteCatalog, SnapshotCatalog};
pub use repository::ProductRepository;
