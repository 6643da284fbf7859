#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks how much of the input is the symbol name.
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = (split as usize).min(rest.len());
    let (name, trie) = rest.split_at(split);
    let name = String::from_utf8_lossy(name);

    let trie = dyexport::ExportTrie::new(trie);
    if let Ok(Some(offset)) = trie.find(&name) {
        let _ = trie.entry_at(offset, &name, 0);
    }
});
