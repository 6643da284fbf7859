//! Byte scanning helpers for NUL-terminated trie strings.
//!
//! Edge labels and re-export names are stored as C strings inside the trie.
//! The search for their terminator goes through `memchr`, which vectorizes
//! the scan on x86-64 and ARM64.

use crate::error::{Error, Result};

/// Finds the position of the first null byte in a slice.
///
/// Returns `data.len()` if there is none.
#[inline(always)]
pub fn memchr_null(data: &[u8]) -> usize {
    memchr::memchr(0, data).unwrap_or(data.len())
}

/// Reads a NUL-terminated byte string starting at `offset`.
///
/// Returns the string bytes (terminator excluded) and the offset just past
/// the terminator.
///
/// # Errors
///
/// [`Error::Truncated`] if `offset` is at or past the end of `data`, and
/// [`Error::UnterminatedString`] if no terminator follows it.
#[inline]
pub fn read_cstr(data: &[u8], offset: usize) -> Result<(&[u8], usize)> {
    let rest = data
        .get(offset..)
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| Error::truncated(offset, data.len()))?;

    let end = memchr_null(rest);
    if end == rest.len() {
        return Err(Error::UnterminatedString {
            offset,
            len: data.len(),
        });
    }

    Ok((&rest[..end], offset + end + 1))
}
