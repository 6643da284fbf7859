//! Single symbol lookup.
//!
//! Follows only the edges that spell out the target name, so a lookup touches
//! one root-to-leaf path instead of the whole trie.

use tracing::trace;

use super::varint::{read_uleb128, skip_uleb128};
use crate::error::{Error, Result};
use crate::util::read_cstr;

/// Finds the terminal node for `symbol`.
///
/// Returns the offset of the node (where its terminal size begins), or
/// `Ok(None)` if the trie has no export of that name. Pass the offset to
/// [`parse_entry_at`](super::export::parse_entry_at) to decode the export.
///
/// Every step consumes at least one name byte, so the walk takes at most
/// `symbol.len() + 1` node visits.
pub fn walk_trie(data: &[u8], symbol: &[u8]) -> Result<Option<usize>> {
    if data.is_empty() {
        return Ok(None);
    }

    let mut node = 0usize;
    let mut matched = 0usize;

    loop {
        let (terminal_size, bytes) = read_uleb128(data, node)?;
        let info_offset = node + bytes;

        if matched == symbol.len() && terminal_size != 0 {
            return Ok(Some(node));
        }

        let children_offset = usize::try_from(terminal_size)
            .ok()
            .and_then(|size| info_offset.checked_add(size))
            .filter(|&offset| offset < data.len())
            .ok_or_else(|| {
                Error::out_of_range(
                    "children",
                    (info_offset as u64).saturating_add(terminal_size),
                    data.len(),
                )
            })?;

        let child_count = data[children_offset];
        let remaining = &symbol[matched..];
        let mut cursor = children_offset + 1;
        let mut next = None;

        for _ in 0..child_count {
            let edge_offset = cursor;
            let (edge, after_edge) = read_cstr(data, cursor)?;

            if !remaining.starts_with(edge) {
                cursor = after_edge + skip_uleb128(data, after_edge)?;
                continue;
            }

            let (child_offset, _) = read_uleb128(data, after_edge)?;
            let child_offset = usize::try_from(child_offset)
                .ok()
                .filter(|&offset| offset != 0 && offset < data.len())
                .ok_or_else(|| Error::out_of_range("child node", child_offset, data.len()))?;

            if edge.is_empty() {
                return Err(Error::NonAdvancingMatch {
                    offset: edge_offset,
                    matched,
                });
            }

            trace!(
                edge = %String::from_utf8_lossy(edge),
                child_offset,
                "found matching edge"
            );
            next = Some((child_offset, matched + edge.len()));
            break;
        }

        match next {
            Some((child_offset, now_matched)) => {
                node = child_offset;
                matched = now_matched;
            }
            None => return Ok(None),
        }
    }
}
