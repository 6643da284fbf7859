#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(entries) = dyexport::parse_trie(data, 0x1_0000_0000) {
        // Looking up decoded names must not panic either.
        let trie = dyexport::ExportTrie::new(data);
        for entry in entries.iter().filter(|e| e.reexport_name.is_none()).take(16) {
            let _ = trie.lookup(&entry.name, 0x1_0000_0000);
        }
    }
});
