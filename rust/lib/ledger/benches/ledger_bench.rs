use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use inward_ledger::{EXPORT_FILE_NAME, LedgerStore, Submission, XlsxStore};

fn sample() -> Submission {
    serde_json::from_value(serde_json::json!({
        "inwardDate": "2024-05-01",
        "personName": "Alice",
        "department": "IT",
        "item": ["Laptop", "Mouse"],
        "make": ["Dell", "Logitech"],
        "imei": "356938035643809",
    }))
    .unwrap()
}

fn seeded_store(tmp: &TempDir, rows: usize) -> XlsxStore {
    let store = XlsxStore::open(&tmp.path().join(EXPORT_FILE_NAME)).unwrap();
    let submission = sample();
    for _ in 0..rows {
        store.append(&submission).unwrap();
    }
    store
}

fn bench_append_empty(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = seeded_store(&tmp, 0);
    let submission = sample();

    c.bench_function("ledger_append_growing", |b| {
        b.iter(|| {
            store.append(black_box(&submission)).unwrap();
        });
    });
}

fn bench_append_500(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = seeded_store(&tmp, 500);
    let submission = sample();

    c.bench_function("ledger_append_after_500", |b| {
        b.iter(|| {
            store.append(black_box(&submission)).unwrap();
        });
    });
}

fn bench_load_500(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = seeded_store(&tmp, 500);

    c.bench_function("ledger_load_500", |b| {
        b.iter(|| {
            let ledger = store.load().unwrap();
            assert_eq!(ledger.len(), 500);
        });
    });
}

fn bench_export_500(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = seeded_store(&tmp, 500);

    c.bench_function("ledger_export_500", |b| {
        b.iter(|| {
            let _ = black_box(store.export().unwrap());
        });
    });
}

criterion_group!(benches, bench_append_empty, bench_append_500, bench_load_500, bench_export_500);
criterion_main!(benches);
