use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use stockroom_catalog::{diff, Product};

fn catalog(n: i64, price_of: impl Fn(i64) -> i64) -> Vec<Product> {
    (0..n)
        .map(|code| {
            Product::new()
                .with_code(code)
                .with_field("name", format!("item {}", code))
                .with_field("price", price_of(code))
                .with_field("attrs", json!({"color": "blue", "tags": ["a", "b"]}))
        })
        .collect()
}

fn bench_diff_in_sync(c: &mut Criterion) {
    let local = catalog(10_000, |code| code);
    let remote = local.clone();

    c.bench_function("diff_10k_in_sync", |b| {
        b.iter(|| {
            let diffs = diff(black_box(&local), black_box(&remote)).unwrap();
            assert!(diffs.is_empty());
        });
    });
}

fn bench_diff_drifted(c: &mut Criterion) {
    let local = catalog(10_000, |code| code);
    // Every tenth price changed, plus a disjoint tail.
    let mut remote = catalog(10_000, |code| if code % 10 == 0 { code + 1 } else { code });
    remote.truncate(9_000);
    remote.extend(catalog(11_000, |code| code).into_iter().skip(10_000));

    c.bench_function("diff_10k_drifted", |b| {
        b.iter(|| diff(black_box(&local), black_box(&remote)).unwrap());
    });
}

criterion_group!(benches, bench_diff_in_sync, bench_diff_drifted);
criterion_main!(benches);
