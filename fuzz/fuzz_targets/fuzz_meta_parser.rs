#![no_main]

use flatstore_meta::MetaDocument;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000_000 {
        return;
    }

    // Try to parse a metadata file - should never panic
    if let Ok(doc) = MetaDocument::parse(Cursor::new(data)) {
        // Whatever parses keeps its key sets through a render/parse cycle
        let rendered = doc.render();
        if let Ok(again) = MetaDocument::parse(Cursor::new(rendered.as_bytes())) {
            assert_eq!(again.info(), doc.info());
        }
    }
});
