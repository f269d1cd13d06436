//! ProductRepository: CRUD over the local product replica.
//!
//! Every operation runs inside one `KVStore::transact` call, so a read
//! followed by a write (allocation, merge, existence checks) either commits
//! as a whole or leaves the store untouched.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use stockroom_core::merge_patch;
use stockroom_kv::{KVError, KVStore, KVTxn};
use tracing::{debug, info, warn};

use crate::allocator::Allocator;
use crate::error::{CatalogError, Operation};
use crate::product::{Code, Product, CODE_FIELD};

/// Key prefix of the product collection.
pub const PRODUCT_PREFIX: &str = "product:";

/// Storage key for a product code.
///
/// The sign bit is flipped so that lexicographic key order equals numeric
/// code order, which makes `scan` return products sorted by code.
pub fn product_key(code: Code) -> String {
    format!("{}{:016x}", PRODUCT_PREFIX, (code.0 as u64) ^ (1 << 63))
}

fn decode(op: Operation, key: &str, bytes: &[u8]) -> Result<Product, CatalogError> {
    let product: Product = serde_json::from_slice(bytes).map_err(CatalogError::serialization(op))?;
    if product.code.is_none() {
        return Err(CatalogError::Serialization {
            op,
            message: format!("record under '{}' has no code", key),
        });
    }
    Ok(product)
}

fn encode(op: Operation, product: &Product) -> Result<Vec<u8>, CatalogError> {
    serde_json::to_vec(product).map_err(CatalogError::serialization(op))
}

/// Local store of product records, keyed on `code`.
pub struct ProductRepository {
    kv: Arc<dyn KVStore>,
    allocator: Allocator,
}

impl ProductRepository {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self::with_allocator(kv, Allocator::default())
    }

    pub fn with_allocator(kv: Arc<dyn KVStore>, allocator: Allocator) -> Self {
        Self { kv, allocator }
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    /// Run `f` in a single store transaction.
    ///
    /// A `CatalogError` from `f` aborts the transaction and is returned as-is;
    /// a failing commit is reported as `CatalogError::Storage`.
    fn in_txn<T>(
        &self,
        op: Operation,
        mut f: impl FnMut(&mut dyn KVTxn) -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        let mut outcome: Option<Result<T, CatalogError>> = None;
        let committed = self.kv.transact(&mut |txn| match f(txn) {
            Ok(value) => {
                outcome = Some(Ok(value));
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                outcome = Some(Err(e));
                Err(KVError::Aborted(reason))
            }
        });

        match (committed, outcome) {
            (Ok(()), Some(result)) => result,
            (Err(_), Some(Err(e))) => Err(e),
            (Err(source), _) => Err(CatalogError::Storage { op, source }),
            (Ok(()), None) => Err(CatalogError::Storage {
                op,
                source: KVError::Aborted("transaction body did not run".into()),
            }),
        }
    }

    fn scan_in(txn: &dyn KVTxn, op: Operation) -> Result<Vec<Product>, CatalogError> {
        txn.scan(PRODUCT_PREFIX)
            .map_err(CatalogError::storage(op))?
            .iter()
            .map(|(key, bytes)| decode(op, key, bytes))
            .collect()
    }

    /// Store a new product.
    ///
    /// A product without a code gets one from the allocator, computed from
    /// the codes already stored. A product that brings its own code keeps
    /// it, but must not clash with a stored one.
    pub fn add(&self, product: Product) -> Result<Product, CatalogError> {
        let op = Operation::Add;
        let allocator = self.allocator;

        let stored = self.in_txn(op, |txn| {
            let mut product = product.clone();
            product.fields.remove(CODE_FIELD);
            let code = match product.code {
                Some(code) => {
                    if txn.get(&product_key(code)).map_err(CatalogError::storage(op))?.is_some() {
                        return Err(CatalogError::AlreadyExists { code });
                    }
                    code
                }
                None => {
                    let existing: HashSet<Code> = Self::scan_in(txn, op)?
                        .into_iter()
                        .filter_map(|p| p.code)
                        .collect();
                    let code = allocator.allocate(existing.iter().copied());
                    if existing.contains(&code) {
                        return Err(CatalogError::AllocationInvariantViolation { code });
                    }
                    product.code = Some(code);
                    code
                }
            };

            let bytes = encode(op, &product)?;
            txn.set(&product_key(code), &bytes).map_err(CatalogError::storage(op))?;
            Ok(product)
        });

        match &stored {
            Ok(p) => info!(code = ?p.code, "product added"),
            Err(e) => warn!(error = %e, code = e.error_code(), "product add rejected"),
        }
        stored
    }

    /// All stored products, ascending by code.
    pub fn get_all(&self) -> Result<Vec<Product>, CatalogError> {
        let op = Operation::GetAll;
        let entries = self.kv.scan(PRODUCT_PREFIX).map_err(CatalogError::storage(op))?;
        let products = entries
            .iter()
            .map(|(key, bytes)| decode(op, key, bytes))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = products.len(), "listed products");
        Ok(products)
    }

    /// Products whose code lies in the offline range, i.e. created while
    /// disconnected and not yet known to the backend.
    pub fn offline_products(&self) -> Result<Vec<Product>, CatalogError> {
        let mut products = self.get_all()?;
        products.retain(|p| p.code.is_some_and(|c| self.allocator.is_offline_code(c)));
        Ok(products)
    }

    /// Get one product. Absence is `Ok(None)`, not an error.
    pub fn get_one(&self, code: Code) -> Result<Option<Product>, CatalogError> {
        let op = Operation::GetOne;
        let key = product_key(code);
        match self.kv.get(&key).map_err(CatalogError::storage(op))? {
            Some(bytes) => Ok(Some(decode(op, &key, &bytes)?)),
            None => {
                debug!(%code, "product not found");
                Ok(None)
            }
        }
    }

    /// Merge `patch` into the stored product `code`.
    ///
    /// Fields follow JSON merge-patch rules: `null` removes a field, nested
    /// objects merge, anything else replaces. The stored code always comes
    /// from the `code` argument; `patch.code` is ignored. Updating a missing
    /// product fails with `NotFound` and writes nothing.
    pub fn update(&self, code: Code, patch: Product) -> Result<Product, CatalogError> {
        let op = Operation::Update;
        let key = product_key(code);
        let mut patch = patch.fields;
        patch.remove(CODE_FIELD);
        let patch = Value::Object(patch);

        let updated = self.in_txn(op, |txn| {
            let bytes = txn
                .get(&key)
                .map_err(CatalogError::storage(op))?
                .ok_or(CatalogError::NotFound { op, code })?;
            let existing = decode(op, &key, &bytes)?;

            let mut merged = Value::Object(existing.fields);
            merge_patch(&mut merged, &patch);
            let mut product = Product::new().with_code(code);
            if let Value::Object(fields) = merged {
                product.fields = fields;
            }
            let bytes = encode(op, &product)?;
            txn.set(&key, &bytes).map_err(CatalogError::storage(op))?;
            Ok(product)
        });

        match &updated {
            Ok(_) => info!(%code, "product updated"),
            Err(e) => warn!(%code, error = %e, "product update rejected"),
        }
        updated
    }

    /// Delete product `code`. Returns whether a record was removed;
    /// deleting a missing code is a no-op.
    pub fn delete(&self, code: Code) -> Result<bool, CatalogError> {
        let op = Operation::Delete;
        let key = product_key(code);
        let removed = self.in_txn(op, |txn| txn.delete(&key).map_err(CatalogError::storage(op)))?;
        if removed {
            info!(%code, "product deleted");
        } else {
            debug!(%code, "delete of missing product ignored");
        }
        Ok(removed)
    }

    pub fn count(&self) -> Result<usize, CatalogError> {
        let entries = self
            .kv
            .scan(PRODUCT_PREFIX)
            .map_err(CatalogError::storage(Operation::GetAll))?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockroom_kv::{MemoryStore, RedbStore};

    fn make_repo() -> ProductRepository {
        ProductRepository::new(Arc::new(MemoryStore::new()))
    }

    fn named(name: &str) -> Product {
        Product::new().with_field("name", name)
    }

    #[test]
    fn first_offline_product_gets_floor() {
        let repo = make_repo();
        let stored = repo.add(named("X")).unwrap();
        assert_eq!(stored.code, Some(Code(9000)));
    }

    #[test]
    fn allocation_continues_after_highest_code() {
        let repo = make_repo();
        repo.add(named("a").with_code(9000)).unwrap();
        repo.add(named("b").with_code(9003)).unwrap();

        let stored = repo.add(named("Y")).unwrap();
        assert_eq!(stored.code, Some(Code(9004)));

        let next = repo.add(named("Z")).unwrap();
        assert_eq!(next.code, Some(Code(9005)));
    }

    #[test]
    fn server_codes_do_not_lower_the_floor() {
        let repo = make_repo();
        repo.add(named("synced").with_code(42)).unwrap();
        let stored = repo.add(named("offline")).unwrap();
        assert_eq!(stored.code, Some(Code(9000)));
    }

    #[test]
    fn add_then_get_one_round_trips() {
        let repo = make_repo();
        let stored = repo
            .add(named("Pen").with_field("price", 3.5).with_field("tags", json!(["a", "b"])))
            .unwrap();
        let code = stored.code.unwrap();

        let fetched = repo.get_one(code).unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[test]
    fn get_one_matches_numeric_value() {
        let repo = make_repo();
        repo.add(named("p").with_code(12)).unwrap();
        let code: Code = "12".parse().unwrap();
        assert!(repo.get_one(code).unwrap().is_some());
        assert!(repo.get_one(Code(13)).unwrap().is_none());
    }

    #[test]
    fn add_with_existing_code_is_rejected() {
        let repo = make_repo();
        repo.add(named("first").with_code(7)).unwrap();
        let err = repo.add(named("second").with_code(7)).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists { code: Code(7) }));
        assert_eq!(repo.get_one(Code(7)).unwrap().unwrap().get("name"), Some(&json!("first")));
    }

    #[test]
    fn exhausted_code_space_reports_collision() {
        let repo = make_repo();
        repo.add(named("max").with_code(i64::MAX)).unwrap();
        let err = repo.add(named("one more")).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::AllocationInvariantViolation { code: Code(i64::MAX) }
        ));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn get_all_is_sorted_by_code() {
        let repo = make_repo();
        for code in [9000, -3, 10, 2] {
            repo.add(named("p").with_code(code)).unwrap();
        }
        let codes: Vec<i64> = repo
            .get_all()
            .unwrap()
            .into_iter()
            .map(|p| p.code.unwrap().0)
            .collect();
        assert_eq!(codes, vec![-3, 2, 10, 9000]);
    }

    #[test]
    fn offline_products_filters_server_codes() {
        let repo = make_repo();
        repo.add(named("synced").with_code(5)).unwrap();
        repo.add(named("draft")).unwrap();
        let offline = repo.offline_products().unwrap();
        assert_eq!(offline.len(), 1);
        assert_eq!(offline[0].code, Some(Code(9000)));
    }

    #[test]
    fn update_merges_and_keeps_code() {
        let repo = make_repo();
        let stored = repo
            .add(named("Pen").with_field("price", 3).with_field("dims", json!({"w": 1, "h": 2})))
            .unwrap();
        let code = stored.code.unwrap();

        let patch = Product::new()
            .with_code(1)
            .with_field("price", 4)
            .with_field("dims", json!({"h": 5}))
            .with_field("name", Value::Null);
        let updated = repo.update(code, patch).unwrap();

        assert_eq!(updated.code, Some(code));
        assert_eq!(
            serde_json::to_value(&updated).unwrap(),
            json!({"code": 9000, "price": 4, "dims": {"w": 1, "h": 5}})
        );
        assert_eq!(repo.get_one(code).unwrap().unwrap(), updated);
        assert!(repo.get_one(Code(1)).unwrap().is_none());
    }

    #[test]
    fn payload_code_never_reaches_the_store() {
        let repo = make_repo();
        let mut product = named("x");
        product.fields.insert("code".into(), json!(5));

        let stored = repo.add(product).unwrap();
        assert_eq!(stored.code, Some(Code(9000)));
        assert!(stored.get("code").is_none());

        let mut patch = Product::new().with_field("price", 2);
        patch.fields.insert("code".into(), json!(7));
        let updated = repo.update(Code(9000), patch).unwrap();
        assert_eq!(
            serde_json::to_value(&updated).unwrap(),
            json!({"code": 9000, "name": "x", "price": 2})
        );

        assert_eq!(repo.get_all().unwrap(), vec![updated]);
        assert_eq!(repo.add(named("y")).unwrap().code, Some(Code(9001)));
    }

    #[test]
    fn update_missing_is_not_found_and_writes_nothing() {
        let repo = make_repo();
        let err = repo.update(Code(9100), named("ghost")).unwrap_err();
        match err {
            CatalogError::NotFound { op, code } => {
                assert_eq!(op, Operation::Update);
                assert_eq!(code, Code(9100));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn delete_existing_and_missing() {
        let repo = make_repo();
        let stored = repo.add(named("gone")).unwrap();
        repo.add(named("kept")).unwrap();

        assert!(repo.delete(stored.code.unwrap()).unwrap());
        assert!(repo.get_one(stored.code.unwrap()).unwrap().is_none());

        let before = repo.get_all().unwrap();
        assert!(!repo.delete(Code(424242)).unwrap());
        assert_eq!(repo.get_all().unwrap(), before);
    }

    #[test]
    fn codes_are_not_reused_after_delete_of_lower_code() {
        let repo = make_repo();
        let a = repo.add(named("a")).unwrap();
        let b = repo.add(named("b")).unwrap();
        repo.delete(a.code.unwrap()).unwrap();
        let c = repo.add(named("c")).unwrap();
        assert_eq!(b.code, Some(Code(9001)));
        assert_eq!(c.code, Some(Code(9002)));
    }

    #[test]
    fn persists_across_reopen_with_redb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.redb");
        let code = {
            let kv: Arc<dyn KVStore> = Arc::new(RedbStore::open(&path).unwrap());
            let repo = ProductRepository::new(kv);
            repo.add(named("durable")).unwrap().code.unwrap()
        };

        let kv: Arc<dyn KVStore> = Arc::new(RedbStore::open(&path).unwrap());
        let repo = ProductRepository::new(kv);
        let fetched = repo.get_one(code).unwrap().unwrap();
        assert_eq!(fetched.get("name"), Some(&json!("durable")));
        assert_eq!(repo.add(named("next")).unwrap().code, Some(Code(9001)));
    }

    #[test]
    fn corrupt_record_surfaces_serialization_error() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(&product_key(Code(1)), b"not json").unwrap();
        let repo = ProductRepository::new(kv);
        let err = repo.get_all().unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
