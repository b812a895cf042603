#![no_main]

use flatstore_core::{parse_spec_str, Schema};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string (ignore invalid UTF-8)
    if let Ok(text) = std::str::from_utf8(data) {
        if text.len() > 10_000 {
            return;
        }

        // Spec strings and metadata headers share the token grammar
        if let Ok(spec) = parse_spec_str(text) {
            if let Ok(schema) = spec.to_schema() {
                let _ = Schema::parse_header(&schema.header_line());
            }
        }
        let _ = Schema::parse_header(text);
    }
});
