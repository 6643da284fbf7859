//! Full export trie decoding.
//!
//! The trie is walked depth first over an explicit work list of
//! [`PendingNode`]s instead of recursing, so a deep or hostile trie cannot
//! exhaust the call stack.

use tracing::{debug, trace};

use super::export::{parse_terminal, SymbolEntry};
use super::node::PendingNode;
use super::varint::read_uleb128;
use crate::error::{Error, Result};
use crate::util::read_cstr;

/// Bounds on the work a single decode may do.
///
/// `None` means bounded by the trie size. A well formed trie visits every
/// node once and each node occupies at least two bytes, so more visits than
/// bytes can only come from shared or cyclic child offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrieLimits {
    /// Maximum number of nodes visited
    pub max_nodes: Option<usize>,
    /// Maximum number of nodes waiting on the work list
    pub max_pending: Option<usize>,
}

impl TrieLimits {
    /// Sets the maximum number of visited nodes.
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }

    /// Sets the maximum work list length.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = Some(max_pending);
        self
    }
}

/// Decodes every export in the trie.
///
/// Entries come out in work-list order: a node's own export first, then its
/// children are pushed in encoded order and popped from the end, so the last
/// encoded child's subtree is emitted first. Regular and thread-local
/// addresses have `load_address` added.
///
/// A malformed trie aborts the whole decode; no partial list is returned.
pub fn decode_trie(
    data: &[u8],
    load_address: u64,
    limits: TrieLimits,
) -> Result<Vec<SymbolEntry>> {
    let mut entries = Vec::new();
    if data.is_empty() {
        return Ok(entries);
    }

    let max_nodes = limits.max_nodes.unwrap_or(data.len());
    let max_pending = limits.max_pending.unwrap_or(data.len());

    let mut pending = vec![PendingNode::root()];
    let mut visited = 0usize;

    while let Some(node) = pending.pop() {
        visited += 1;
        if visited > max_nodes {
            return Err(Error::NodeLimitExceeded { limit: max_nodes });
        }

        if node.offset >= data.len() {
            return Err(Error::out_of_range("node", node.offset as u64, data.len()));
        }

        let (terminal_size, bytes) = read_uleb128(data, node.offset)?;
        let info_offset = node.offset + bytes;
        trace!(offset = node.offset, terminal_size, "visiting trie node");

        if terminal_size != 0 {
            let entry = parse_terminal(
                data,
                info_offset,
                terminal_size,
                &node.prefix,
                load_address,
            )?;
            entries.push(entry);
        }

        let children_offset = usize::try_from(terminal_size)
            .ok()
            .and_then(|size| info_offset.checked_add(size))
            .ok_or_else(|| Error::out_of_range("children", terminal_size, data.len()))?;

        let Some(&child_count) = data.get(children_offset) else {
            // A trailing node may omit its child count when nothing else is left.
            if pending.is_empty() {
                debug!(offset = node.offset, "trie ends at node without child count");
                break;
            }
            return Err(Error::truncated(children_offset, data.len()));
        };

        let mut cursor = children_offset + 1;
        for _ in 0..child_count {
            let (edge, next) = read_cstr(data, cursor)?;
            if edge.is_empty() {
                return Err(Error::EmptyEdge { offset: cursor });
            }
            let (child_offset, bytes) = read_uleb128(data, next)?;
            cursor = next + bytes;

            let child_offset = usize::try_from(child_offset)
                .ok()
                .filter(|&offset| offset < data.len())
                .ok_or_else(|| Error::out_of_range("child node", child_offset, data.len()))?;
            if child_offset <= node.offset {
                return Err(Error::NonAdvancingNode {
                    parent: node.offset,
                    child: child_offset,
                });
            }

            pending.push(node.child(edge, child_offset));
        }

        if pending.len() > max_pending {
            return Err(Error::NodeLimitExceeded { limit: max_pending });
        }
    }

    debug!(entries = entries.len(), visited, "decoded export trie");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::varint::write_uleb128;

    /// Appends a terminal node `{size, flags=0, value}` with no children.
    fn leaf(out: &mut Vec<u8>, value: u64) {
        let mut info = vec![0x00];
        write_uleb128(value, &mut info);
        out.push(info.len() as u8);
        out.extend_from_slice(&info);
        out.push(0x00);
    }

    #[test]
    fn test_empty_trie() {
        assert!(decode_trie(&[], 0, TrieLimits::default()).unwrap().is_empty());
    }

    #[test]
    fn test_single_child() {
        // root: no terminal, one child "_a" at 6
        let mut data = vec![0x00, 0x01, b'_', b'a', 0x00, 0x06];
        leaf(&mut data, 0x44);

        let entries = decode_trie(&data, 0x1000, TrieLimits::default()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "_a");
        assert_eq!(entries[0].address, 0x1044);
    }

    #[test]
    fn test_terminal_root() {
        // An empty name exported at the root, plus one child.
        let mut data = vec![0x02, 0x00, 0x01, 0x01, b'x', 0x00, 0x07];
        leaf(&mut data, 0x02);

        let entries = decode_trie(&data, 0, TrieLimits::default()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["", "x"]);
        assert_eq!(entries[0].address, 0x01);
    }

    #[test]
    fn test_trailing_node_without_child_count() {
        let mut data = vec![0x00, 0x01, b'_', b'a', 0x00, 0x06];
        data.extend_from_slice(&[0x02, 0x00, 0x09]);

        let entries = decode_trie(&data, 0, TrieLimits::default()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address, 0x09);
    }

    #[test]
    fn test_child_pointing_backwards() {
        let data = vec![0x00, 0x01, b'_', 0x00, 0x00];
        assert_eq!(
            decode_trie(&data, 0, TrieLimits::default()),
            Err(Error::NonAdvancingNode { parent: 0, child: 0 })
        );
    }

    #[test]
    fn test_empty_edge() {
        let data = vec![0x00, 0x01, 0x00, 0x03, 0x00, 0x00];
        assert_eq!(
            decode_trie(&data, 0, TrieLimits::default()),
            Err(Error::EmptyEdge { offset: 2 })
        );
    }

    #[test]
    fn test_last_child_first() {
        // root -> "a" (0x08), "b" (0x0C)
        let mut data = vec![0x00, 0x02, b'a', 0x00, 0x08, b'b', 0x00, 0x0C];
        leaf(&mut data, 0x01);
        leaf(&mut data, 0x02);

        let entries = decode_trie(&data, 0, TrieLimits::default()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_child_past_end() {
        let data = vec![0x00, 0x01, b'_', 0x00, 0x40];
        assert!(matches!(
            decode_trie(&data, 0, TrieLimits::default()),
            Err(Error::OffsetOutOfRange { what: "child node", offset: 0x40, .. })
        ));
    }

    #[test]
    fn test_shared_child_hits_node_limit() {
        // Root with two edges into the same node; that node points twice at the
        // next one, and so on. Each level doubles the work.
        let mut data = Vec::new();
        let levels = 8usize;
        let node_len = 1 + 1 + 2 * 3;
        for level in 0..levels {
            let next = ((level + 1) * node_len) as u8;
            data.extend_from_slice(&[0x00, 0x02, b'a', 0x00, next, b'b', 0x00, next]);
        }
        leaf(&mut data, 0);

        let err = decode_trie(&data, 0, TrieLimits::default()).unwrap_err();
        assert_eq!(err, Error::NodeLimitExceeded { limit: data.len() });

        let err = decode_trie(&data, 0, TrieLimits::default().with_max_nodes(10)).unwrap_err();
        assert_eq!(err, Error::NodeLimitExceeded { limit: 10 });
    }

    #[test]
    fn test_pending_limit() {
        let data = vec![0x00, 0x02, b'a', 0x00, 0x08, b'b', 0x00, 0x08, 0x00, 0x00];
        // Two pending children with a limit of one.
        assert_eq!(
            decode_trie(&data, 0, TrieLimits::default().with_max_pending(1)),
            Err(Error::NodeLimitExceeded { limit: 1 })
        );
    }
}
