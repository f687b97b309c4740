#![no_main]

use libfuzzer_sys::fuzz_target;
use respack::Archive;
use std::io::{Read, Write};
use tempfile::NamedTempFile;

fuzz_target!(|data: &[u8]| {
    // Skip inputs shorter than the 8-byte header
    if data.len() < 8 {
        return;
    }

    // Write fuzz data to temporary file
    let mut temp_file = match NamedTempFile::new() {
        Ok(f) => f,
        Err(_) => return,
    };

    if temp_file.write_all(data).is_err() {
        return;
    }

    if temp_file.flush().is_err() {
        return;
    }

    // Try to open pack - should never panic
    let mut archive = match Archive::open(temp_file.path()) {
        Ok(a) => a,
        Err(_) => return, // Expected for invalid data
    };

    let names: Vec<String> = archive
        .resource_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    // Acquire, release and stream every entry - should never panic
    for name in &names {
        if let Ok(id) = archive.acquire_by_path(name) {
            let _ = archive.data(id);
            let _ = archive.release(id);
        }
        if let Ok(mut stream) = archive.stream(name) {
            let mut sink = Vec::new();
            let _ = stream.read_to_end(&mut sink);
        }
    }

    let _ = archive.sweep();
    let _ = archive.contains("");
    let _ = archive.contains("settings.sgml");
    let _ = archive.contains("..\\..\\etc/passwd");

    archive.close();
});
