use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, Table, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::{KVStore, KVTxn};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

fn storage_err(e: impl ToString) -> KVError {
    KVError::Storage(e.to_string())
}

/// RedbStore is a KVStore implementation backed by redb: a pure-Rust embedded
/// key-value database. Every call runs in its own transaction.
///
/// The database file is closed when the last handle is dropped.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(storage_err)?;
        }
        let db = Database::create(path).map_err(storage_err)?;

        // Ensure the table exists by doing a write transaction.
        let write_txn = db.begin_write().map_err(storage_err)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        debug!("RedbStore: opened {:?}", path);
        Ok(Self { db: Arc::new(db) })
    }

    fn write<F>(&self, f: F) -> Result<(), KVError>
    where
        F: FnOnce(&mut Table<'_, &'static str, &'static [u8]>) -> Result<(), KVError>,
    {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(storage_err)?;
            f(&mut table)?;
        }
        write_txn.commit().map_err(storage_err)
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(TABLE).map_err(storage_err)?;

        match table.get(key) {
            Ok(Some(val)) => Ok(Some(val.value().to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.write(|table| {
            table.insert(key, value).map_err(storage_err)?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        self.write(|table| {
            table.remove(key).map_err(storage_err)?;
            Ok(())
        })
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError> {
        self.write(|table| {
            for (key, value) in entries {
                table.insert(*key, *value).map_err(storage_err)?;
            }
            Ok(())
        })
    }

    fn batch_delete(&self, keys: &[&str]) -> Result<(), KVError> {
        self.write(|table| {
            for key in keys {
                table.remove(*key).map_err(storage_err)?;
            }
            Ok(())
        })
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(TABLE).map_err(storage_err)?;

        let mut results = Vec::new();
        for entry in table.range(prefix..).map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_string(), value.value().to_vec()));
        }

        Ok(results)
    }

    fn transact(
        &self,
        f: &mut dyn FnMut(&mut dyn KVTxn) -> Result<(), KVError>,
    ) -> Result<(), KVError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let outcome = {
            let table = write_txn.open_table(TABLE).map_err(storage_err)?;
            let mut txn = RedbTxn { table };
            f(&mut txn)
        };

        match outcome {
            Ok(()) => write_txn.commit().map_err(storage_err),
            Err(e) => {
                write_txn.abort().map_err(storage_err)?;
                debug!("RedbStore: transaction rolled back: {}", e);
                Err(e)
            }
        }
    }
}

/// A redb write transaction's table, exposed as a KVTxn.
struct RedbTxn<'txn> {
    table: Table<'txn, &'static str, &'static [u8]>,
}

impl KVTxn for RedbTxn<'_> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let value = self.table.get(key).map_err(storage_err)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let mut results = Vec::new();
        for entry in self.table.range(prefix..).map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_string(), value.value().to_vec()));
        }
        Ok(results)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.table.insert(key, value).map_err(storage_err)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, KVError> {
        let removed = self.table.remove(key).map_err(storage_err)?;
        Ok(removed.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> (RedbStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn set_get_delete() {
        let (store, _dir) = open_store();

        store.set("product:a", b"one").unwrap();
        assert_eq!(store.get("product:a").unwrap(), Some(b"one".to_vec()));

        store.delete("product:a").unwrap();
        assert!(store.get("product:a").unwrap().is_none());

        // Deleting again is fine.
        store.delete("product:a").unwrap();
    }

    #[test]
    fn scan_stops_at_prefix_boundary() {
        let (store, _dir) = open_store();
        store
            .batch_set(&[
                ("category:x", b"c".as_slice()),
                ("product:1", b"p1".as_slice()),
                ("product:2", b"p2".as_slice()),
                ("zzz", b"z".as_slice()),
            ])
            .unwrap();

        let products = store.scan("product:").unwrap();
        let keys: Vec<_> = products.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["product:1", "product:2"]);

        store.batch_delete(&["product:1", "product:2"]).unwrap();
        assert!(store.scan("product:").unwrap().is_empty());
        assert_eq!(store.scan("").unwrap().len(), 2);
    }

    #[test]
    fn transact_commits_and_sees_own_writes() {
        let (store, _dir) = open_store();
        store.set("k:1", b"a").unwrap();

        store
            .transact(&mut |txn| {
                txn.set("k:2", b"b")?;
                assert_eq!(txn.scan("k:")?.len(), 2);
                assert!(txn.delete("k:1")?);
                assert!(!txn.delete("k:missing")?);
                Ok(())
            })
            .unwrap();

        assert!(store.get("k:1").unwrap().is_none());
        assert_eq!(store.get("k:2").unwrap(), Some(b"b".to_vec()));
    }

    #[test]
    fn transact_error_rolls_back() {
        let (store, _dir) = open_store();
        store.set("k:1", b"a").unwrap();

        let err = store
            .transact(&mut |txn| {
                txn.set("k:2", b"b")?;
                txn.delete("k:1")?;
                Err(KVError::Aborted("nope".into()))
            })
            .unwrap_err();
        assert!(matches!(err, KVError::Aborted(_)));

        assert_eq!(store.get("k:1").unwrap(), Some(b"a".to_vec()));
        assert!(store.get("k:2").unwrap().is_none());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/reopen.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.set("product:x", b"kept").unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("product:x").unwrap(), Some(b"kept".to_vec()));
    }
}
