use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::KVError;
use crate::traits::{KVStore, KVTxn};

type Map = BTreeMap<String, Vec<u8>>;

/// MemoryStore is a non-durable KVStore kept in a BTreeMap.
///
/// Used in tests and for throwaway replicas. `transact` stages writes on a
/// copy of the map and swaps it in only when the closure succeeds.
#[derive(Default)]
pub struct MemoryStore {
    map: RwLock<Map>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, KVError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, KVError> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Map>, KVError> {
        self.map
            .read()
            .map_err(|_| KVError::Storage("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Map>, KVError> {
        self.map
            .write()
            .map_err(|_| KVError::Storage("memory store lock poisoned".into()))
    }
}

fn scan_map(map: &Map, prefix: &str) -> Vec<(String, Vec<u8>)> {
    map.range(prefix.to_string()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

impl KVStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.write()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        self.write()?.remove(key);
        Ok(())
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError> {
        let mut map = self.write()?;
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_vec());
        }
        Ok(())
    }

    fn batch_delete(&self, keys: &[&str]) -> Result<(), KVError> {
        let mut map = self.write()?;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let map = self.read()?;
        Ok(scan_map(&map, prefix))
    }

    fn transact(
        &self,
        f: &mut dyn FnMut(&mut dyn KVTxn) -> Result<(), KVError>,
    ) -> Result<(), KVError> {
        let mut map = self.write()?;
        let mut txn = MemoryTxn { staged: map.clone() };
        f(&mut txn)?;
        *map = txn.staged;
        Ok(())
    }
}

struct MemoryTxn {
    staged: Map,
}

impl KVTxn for MemoryTxn {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        Ok(self.staged.get(key).cloned())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        Ok(scan_map(&self.staged, prefix))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.staged.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, KVError> {
        Ok(self.staged.remove(key).is_some())
    }
}
