//! Hand-built export tries shared by the integration tests.

#![allow(dead_code)]

use dyexport::trie::varint::write_uleb128;

/// `_foo -> 0x1000`, `_bar -> 0x2000`, `_foobar -> 0x3000`.
///
/// ```text
/// 0x00 root     "_foo" -> 0x0E, "_bar" -> 0x1D
/// 0x0E _foo     terminal 0x1000, "bar" -> 0x18
/// 0x18 _foobar  terminal 0x3000
/// 0x1D _bar     terminal 0x2000
/// ```
pub const SAMPLE_TRIE: &[u8] = &[
    0x00, 0x02, b'_', b'f', b'o', b'o', 0x00, 0x0E, b'_', b'b', b'a', b'r', 0x00, 0x1D,
    0x03, 0x00, 0x80, 0x20, 0x01, b'b', b'a', b'r', 0x00, 0x18,
    0x03, 0x00, 0x80, 0x60, 0x00,
    0x03, 0x00, 0x80, 0x40, 0x00,
];

/// Offset of the `_bar` node in [`SAMPLE_TRIE`].
pub const SAMPLE_BAR_NODE: usize = 0x1D;

/// Offset of the byte holding `_bar`'s child offset in [`SAMPLE_TRIE`].
pub const SAMPLE_BAR_EDGE_TARGET: usize = 0x0D;

/// Encodes a childless node whose terminal payload is `payload`.
pub fn leaf_with_payload(payload: &[u8]) -> Vec<u8> {
    let mut node = Vec::new();
    write_uleb128(payload.len() as u64, &mut node);
    node.extend_from_slice(payload);
    node.push(0x00);
    node
}

/// Encodes a childless regular export.
pub fn leaf(value: u64) -> Vec<u8> {
    let mut payload = vec![0x00];
    write_uleb128(value, &mut payload);
    leaf_with_payload(&payload)
}

/// Builds a one-level trie: the root has one edge per export.
///
/// Names must not be prefixes of one another, as in any canonical trie.
pub fn flat_trie<S: AsRef<str>>(exports: &[(S, Vec<u8>)]) -> Vec<u8> {
    // The root's size depends on the child offsets it encodes, so iterate
    // until the layout is stable.
    let mut root_len = 0;
    loop {
        let root = root_node(exports, root_len);
        if root.len() == root_len {
            let mut out = root;
            for (_, node) in exports {
                out.extend_from_slice(node);
            }
            return out;
        }
        root_len = root.len();
    }
}

fn root_node<S: AsRef<str>>(exports: &[(S, Vec<u8>)], base: usize) -> Vec<u8> {
    assert!(exports.len() <= u8::MAX as usize);
    let mut out = vec![0x00, exports.len() as u8];
    let mut offset = base;
    for (name, node) in exports {
        out.extend_from_slice(name.as_ref().as_bytes());
        out.push(0x00);
        write_uleb128(offset as u64, &mut out);
        offset += node.len();
    }
    out
}
