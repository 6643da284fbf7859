//! Export trie parsing for Mach-O images and dyld caches.
//!
//! The export trie is a compact representation of exported symbols. It uses
//! a trie (prefix tree) where each node can contain:
//! - Terminal information (flags, address, optional other value)
//! - Children edges (label prefix + offset to child node)
//!
//! # Node Layout
//!
//! ```text
//! uleb128   terminal_size
//! [u8; terminal_size]  terminal payload (flags, value, ...)
//! u8        child_count
//! child_count * { edge label, NUL, uleb128 child_offset }
//! ```
//!
//! All offsets are relative to the start of the trie.

mod decode;
mod export;
mod node;
pub mod varint;
mod walk;

pub use decode::*;
pub use export::*;
pub use node::*;
pub use walk::*;

use crate::error::Result;

/// Parser for export tries.
///
/// Holds only a borrowed view of the trie bytes, so one parser can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct ExportTrie<'a> {
    data: &'a [u8],
    limits: TrieLimits,
}

impl<'a> ExportTrie<'a> {
    /// Creates a new parser for the given export trie data.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_limits(data, TrieLimits::default())
    }

    /// Creates a parser with explicit decode limits.
    pub fn with_limits(data: &'a [u8], limits: TrieLimits) -> Self {
        Self { data, limits }
    }

    /// Parses all exports from the trie.
    pub fn parse_all(&self, load_address: u64) -> Result<Vec<SymbolEntry>> {
        decode_trie(self.data, load_address, self.limits)
    }

    /// Finds the offset of the terminal node exporting `name`.
    pub fn find(&self, name: &str) -> Result<Option<usize>> {
        walk_trie(self.data, name.as_bytes())
    }

    /// Decodes the terminal node at `offset`, as returned by [`find`](Self::find).
    pub fn entry_at(
        &self,
        offset: usize,
        name: &str,
        load_address: u64,
    ) -> Result<Option<SymbolEntry>> {
        parse_entry_at(self.data, offset, name.as_bytes(), load_address)
    }

    /// Looks up a single symbol by name.
    pub fn lookup(&self, name: &str, load_address: u64) -> Result<Option<SymbolEntry>> {
        match self.find(name)? {
            Some(offset) => self.entry_at(offset, name, load_address),
            None => Ok(None),
        }
    }
}
