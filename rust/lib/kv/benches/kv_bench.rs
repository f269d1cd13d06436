use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use stockroom_kv::{KVStore, MemoryStore, RedbStore};

fn bench_redb_set(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = RedbStore::open(&tmp.path().join("bench.redb")).unwrap();

    c.bench_function("redb_set", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("product:{:016x}", i);
            store.set(black_box(&key), black_box(br#"{"name":"widget"}"#)).unwrap();
            i += 1;
        });
    });
}

fn bench_redb_scan(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = RedbStore::open(&tmp.path().join("bench.redb")).unwrap();

    for i in 0..1000 {
        let key = format!("product:{:016x}", i);
        store.set(&key, br#"{"name":"widget"}"#).unwrap();
    }

    c.bench_function("redb_scan_1000", |b| {
        b.iter(|| {
            let results = store.scan(black_box("product:")).unwrap();
            assert_eq!(results.len(), 1000);
        });
    });
}

fn bench_redb_transact_scan_then_set(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = RedbStore::open(&tmp.path().join("bench.redb")).unwrap();

    for i in 0..1000 {
        let key = format!("product:{:016x}", i);
        store.set(&key, br#"{"name":"widget"}"#).unwrap();
    }

    // Shape of an offline add: read the collection, then write one record.
    c.bench_function("redb_transact_scan_then_set", |b| {
        b.iter(|| {
            store
                .transact(&mut |txn| {
                    let n = txn.scan("product:")?.len();
                    txn.set("product:last", black_box(&n.to_le_bytes()))
                })
                .unwrap();
        });
    });
}

fn bench_memory_get(c: &mut Criterion) {
    let store = MemoryStore::new();
    for i in 0..1000 {
        let key = format!("product:{:04}", i);
        store.set(&key, b"value").unwrap();
    }

    c.bench_function("memory_get", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("product:{:04}", i % 1000);
            let _ = store.get(black_box(&key)).unwrap();
            i += 1;
        });
    });
}

criterion_group!(
    benches,
    bench_redb_set,
    bench_redb_scan,
    bench_redb_transact_scan_then_set,
    bench_memory_get,
);
criterion_main!(benches);
