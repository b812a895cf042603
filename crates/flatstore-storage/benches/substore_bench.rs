use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use flatstore_core::{FieldValues, SyncMode};
use flatstore_storage::{SubStore, SubStoreConfig, SubStoreCreator};
use tempfile::{tempdir, TempDir};

const N: usize = 2_000;

fn populated_store(n: usize) -> (TempDir, SubStore) {
    let dir = tempdir().unwrap();
    let creator = SubStoreCreator::new(dir.path(), SyncMode::None);
    let path = creator.create("bench", &["id[pk]", "name", "group"]).unwrap();
    let store = SubStore::open_with_config(
        &path,
        SubStoreConfig {
            sync_mode: SyncMode::None,
        },
    )
    .unwrap();
    for i in 0..n {
        store
            .insert_one(
                &[],
                &FieldValues::new()
                    .with("name", format!("user{}", i))
                    .with("group", format!("g{}", i % 10)),
            )
            .unwrap();
    }
    (dir, store)
}

fn insert_auto_key(c: &mut Criterion) {
    c.bench_function("insert_auto_key_500", |b| {
        b.iter_batched(
            || populated_store(0),
            |(_dir, store)| {
                for i in 0..500 {
                    store
                        .insert_one(&[], &FieldValues::new().with("name", format!("n{}", i)))
                        .unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn scan_get_many(c: &mut Criterion) {
    let (_dir, store) = populated_store(N);
    let conditions = FieldValues::new().with("group", "g3");
    c.bench_function("get_many_scan_2k", |b| {
        b.iter(|| store.get_many(&conditions).unwrap());
    });
}

fn lookup_last_key(c: &mut Criterion) {
    let (_dir, store) = populated_store(N);
    let conditions = FieldValues::new().with("id", N as i64);
    c.bench_function("get_one_last_key_2k", |b| {
        b.iter(|| store.get_one(&conditions).unwrap());
    });
}

fn delete_first(c: &mut Criterion) {
    c.bench_function("delete_one_first_of_2k", |b| {
        b.iter_batched(
            || populated_store(N),
            |(_dir, store)| {
                store.delete_one(&FieldValues::new().with("id", 1)).unwrap();
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, insert_auto_key, scan_get_many, lookup_last_key, delete_first);
criterion_main!(benches);
