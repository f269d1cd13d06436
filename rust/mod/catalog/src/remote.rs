//! The authoritative remote catalog, as seen by reconciliation.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CatalogError;
use crate::product::Product;
use crate::reconcile::{diff, Difference};
use crate::repository::ProductRepository;

/// Source of the remote product list. Transport is up to the implementor.
pub trait RemoteCatalog: Send + Sync {
    fn fetch_products(&self) -> Result<Vec<Product>, CatalogError>;
}

/// A remote catalog exported to a JSON file (an array of products).
pub struct SnapshotCatalog {
    path: PathBuf,
}

impl SnapshotCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RemoteCatalog for SnapshotCatalog {
    fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let content = std::fs::read(&self.path)
            .map_err(|e| CatalogError::Remote(format!("read {}: {}", self.path.display(), e)))?;
        let products: Vec<Product> = serde_json::from_slice(&content)
            .map_err(|e| CatalogError::Remote(format!("parse {}: {}", self.path.display(), e)))?;
        debug!(count = products.len(), path = %self.path.display(), "loaded remote snapshot");
        Ok(products)
    }
}

/// A fixed in-memory product list.
impl RemoteCatalog for Vec<Product> {
    fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.clone())
    }
}

impl ProductRepository {
    /// Load the local replica, fetch the remote catalog and diff them.
    pub fn reconcile(&self, remote: &dyn RemoteCatalog) -> Result<Vec<Difference>, CatalogError> {
        let local = self.get_all()?;
        let remote = remote.fetch_products()?;
        diff(&local, &remote)
    }
}
