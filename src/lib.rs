//! dyexport - Export trie decoder for Mach-O images and dyld shared caches.
//!
//! This library decodes the export trie found behind `LC_DYLD_EXPORTS_TRIE`
//! and `LC_DYLD_INFO` in Mach-O images and in dyld shared caches. Callers
//! extract the trie bytes from the containing file themselves and hand them
//! over together with the image load address.
//!
//! # Features
//!
//! - Full decode of every export, in work-list (stack) order
//! - Targeted lookup that walks a single root-to-leaf path
//! - Strict bounds checking: malformed tries produce errors, never panics
//! - No recursion: traversal depth is bounded by heap, not stack
//!
//! # Example
//!
//! ```no_run
//! use dyexport::ExportTrie;
//!
//! fn main() -> dyexport::Result<()> {
//!     let data = std::fs::read("exports.trie").expect("read trie");
//!     let trie = ExportTrie::new(&data);
//!
//!     for entry in trie.parse_all(0x1_8000_0000)? {
//!         println!("{}", entry);
//!     }
//!
//!     if let Some(entry) = trie.lookup("_malloc", 0x1_8000_0000)? {
//!         println!("_malloc at {:#x}", entry.address);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod trie;
pub mod util;

// Re-export main types
pub use error::{Error, Result};
pub use trie::{
    resolve_reexport_dylibs, ExportFlags, ExportKind, ExportTrie, PendingNode, SymbolEntry,
    TrieLimits,
};

/// Decodes every export in `data` with default limits.
///
/// # Arguments
///
/// * `data` - The raw export trie bytes
/// * `load_address` - Added to regular and thread-local addresses
pub fn parse_trie(data: &[u8], load_address: u64) -> Result<Vec<SymbolEntry>> {
    ExportTrie::new(data).parse_all(load_address)
}

/// Finds the terminal node offset of `symbol` in `data`.
///
/// Returns `Ok(None)` if the symbol is not exported.
pub fn walk_trie(data: &[u8], symbol: &str) -> Result<Option<usize>> {
    ExportTrie::new(data).find(symbol)
}
