#![no_main]

use bf8c::compile::{build, BuildOptions};
use bf8c::module_source::MemoryModuleStore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > 16 * 1024 {
        &data[..16 * 1024]
    } else {
        data
    };
    let text = String::from_utf8_lossy(data);

    // `\0` separates the entry from modules `m0`, `m1`, ... so inclusion and cycles get exercised.
    let mut parts = text.split('\0');
    let entry = parts.next().unwrap_or_default();
    let mut store = MemoryModuleStore::new();
    for (i, src) in parts.enumerate() {
        store.insert(format!("m{i}"), src);
    }

    let Ok(artifact) = build(entry, &BuildOptions::new("0"), &store) else {
        return;
    };
    assert_eq!(artifact.size_bytes(), artifact.text().len());
    assert!(artifact.name.starts_with("bf8_v0+"));
});
