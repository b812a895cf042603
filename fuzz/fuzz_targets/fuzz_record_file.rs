#![no_main]

use flatstore_core::FieldValues;
use flatstore_storage::RecordIter;
use libfuzzer_sys::fuzz_target;
use std::io::Write;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000_000 {
        return;
    }

    let fields: Arc<[String]> = Arc::from(vec!["id".to_string(), "name".to_string()]);

    // Write to temporary file and scan it as a record file
    if let Ok(mut temp_file) = tempfile::NamedTempFile::new() {
        if temp_file.write_all(data).is_ok() {
            if let Ok(iter) = RecordIter::open(temp_file.path(), fields, FieldValues::new()) {
                for record in iter.take(10_000) {
                    if record.is_err() {
                        break;
                    }
                }
            }
        }
    }
});
