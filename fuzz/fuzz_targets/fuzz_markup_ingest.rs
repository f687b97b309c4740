#![no_main]

use libfuzzer_sys::fuzz_target;
use respack::{ingest, ingest_str, IngestOptions};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes through the streaming path - should never panic
    let options = IngestOptions {
        max_depth: 64,
        ..IngestOptions::default()
    };
    let tree = match respack::markup::ingest_with(data, data.len() as u64, &options) {
        Ok(tree) => tree,
        Err(_) => return,
    };

    let _ = ingest(data, data.len() as u64);

    // Whatever was accepted must survive a dump and re-ingest
    if let Some(body) = tree.body() {
        let text = match respack::markup::dump_to_vec(body) {
            Ok(text) => text,
            Err(_) => return,
        };
        let text = String::from_utf8_lossy(&text);
        let reparsed = ingest_str(&text).expect("dumped metadata must re-ingest");
        assert!(reparsed.body().is_some());
    }
});
