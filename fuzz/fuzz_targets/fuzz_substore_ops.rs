#![no_main]

use arbitrary::Arbitrary;
use flatstore::{FieldValues, Store, StoreConfig, SyncMode, Value};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum SubStoreOp {
    Insert { id: Option<i16>, name: String },
    Get { id: i16 },
    GetByName { name: String },
    Delete { id: i16 },
}

fuzz_target!(|ops: Vec<SubStoreOp>| {
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };
    let config = StoreConfig {
        sync_mode: SyncMode::None,
        ..Default::default()
    };
    let Ok(store) = Store::open_with_config(dir.path().join("fuzz.estore"), config) else {
        return;
    };
    let Ok(items) = store.create_sub_store("items", &["id[pk]", "name"]) else {
        return;
    };

    for op in ops.iter().take(100) { // Limit operations to prevent timeout
        match op {
            SubStoreOp::Insert { id, name } => {
                if name.len() <= 256 {
                    let mut row = FieldValues::new().with("name", name.as_str());
                    if let Some(id) = id {
                        row.set("id", Value::from(*id));
                    }
                    let _ = items.insert_one(&[], &row);
                }
            }
            SubStoreOp::Get { id } => {
                let _ = items.get_one(&FieldValues::new().with("id", *id));
            }
            SubStoreOp::GetByName { name } => {
                if name.len() <= 256 {
                    let _ = items.get_many(&FieldValues::new().with("name", name.as_str()));
                }
            }
            SubStoreOp::Delete { id } => {
                let _ = items.delete_one(&FieldValues::new().with("id", *id));
            }
        }
    }

    // Key set must still describe the record file exactly
    if let (Ok(meta), Ok(records)) = (items.meta(), items.get_all()) {
        let on_disk: flatstore::KeySet = records
            .iter()
            .filter_map(|r| r.text("id").and_then(|t| t.parse().ok()))
            .collect();
        assert_eq!(meta.key_set("id"), Some(&on_disk));
    }
});
