pub mod config;
pub mod types;

pub use config::{StoreConfig, DEFAULT_OFFLINE_FLOOR};
pub use types::merge_patch;
