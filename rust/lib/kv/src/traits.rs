use crate::error::KVError;

/// KVStore is the local persistent key-value interface the offline catalog
/// is built on.
///
/// Keys follow a namespaced convention: `product:<encoded code>`,
/// `category:<id>`, etc. A collection is the set of keys sharing a prefix.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair, replacing any existing value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Set several pairs in one transaction.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError>;

    /// Delete several keys in one transaction.
    fn batch_delete(&self, keys: &[&str]) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Run `f` inside a single read-write transaction.
    ///
    /// Reads made through the `KVTxn` see the transaction's own writes.
    /// If `f` returns an error nothing it wrote is persisted.
    fn transact(
        &self,
        f: &mut dyn FnMut(&mut dyn KVTxn) -> Result<(), KVError>,
    ) -> Result<(), KVError>;
}

/// Operations available inside [`KVStore::transact`].
pub trait KVTxn {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Returns true if it existed.
    fn delete(&mut self, key: &str) -> Result<bool, KVError>;
}
