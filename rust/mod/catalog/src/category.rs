//! CategoryStore: plain keyed storage for product categories.
//!
//! No allocation, no reconciliation: categories are always created with an
//! explicit `id` and written as-is.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stockroom_kv::KVStore;
use tracing::debug;

use crate::error::{CatalogError, Operation};

/// Key prefix of the category collection.
pub const CATEGORY_PREFIX: &str = "category:";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Category {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

pub struct CategoryStore {
    kv: Arc<dyn KVStore>,
}

impl CategoryStore {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv }
    }

    fn make_key(id: &str) -> String {
        format!("{}{}", CATEGORY_PREFIX, id)
    }

    /// Insert or replace a category.
    pub fn put(&self, category: Category) -> Result<Category, CatalogError> {
        let op = Operation::PutCategory;
        if category.id.trim().is_empty() {
            return Err(CatalogError::Validation("category id must not be empty".into()));
        }
        let bytes = serde_json::to_vec(&category).map_err(CatalogError::serialization(op))?;
        self.kv
            .set(&Self::make_key(&category.id), &bytes)
            .map_err(CatalogError::storage(op))?;
        debug!(id = %category.id, "category stored");
        Ok(category)
    }

    pub fn get(&self, id: &str) -> Result<Option<Category>, CatalogError> {
        let op = Operation::GetCategory;
        match self.kv.get(&Self::make_key(id)).map_err(CatalogError::storage(op))? {
            Some(bytes) => {
                let category = serde_json::from_slice(&bytes).map_err(CatalogError::serialization(op))?;
                Ok(Some(category))
            }
            None => Ok(None),
        }
    }

    /// All categories, sorted by id.
    pub fn list(&self) -> Result<Vec<Category>, CatalogError> {
        let op = Operation::ListCategories;
        let entries = self.kv.scan(CATEGORY_PREFIX).map_err(CatalogError::storage(op))?;
        let mut categories = Vec::with_capacity(entries.len());
        for (_key, bytes) in entries {
            let category: Category =
                serde_json::from_slice(&bytes).map_err(CatalogError::serialization(op))?;
            categories.push(category);
        }
        Ok(categories)
    }

    /// Delete a category. Returns whether it existed; a missing id is a no-op.
    pub fn delete(&self, id: &str) -> Result<bool, CatalogError> {
        let op = Operation::DeleteCategory;
        let key = Self::make_key(id);
        let mut existed = false;
        self.kv
            .transact(&mut |txn| {
                existed = txn.delete(&key)?;
                Ok(())
            })
            .map_err(CatalogError::storage(op))?;
        Ok(existed)
    }
}
