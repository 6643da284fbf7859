//! ULEB128 decoding for export trie fields.
//!
//! Every integer in the trie (terminal sizes, flags, addresses, ordinals and
//! child offsets) is an unsigned little-endian base-128 value. The readers take
//! the blob plus an explicit offset and return how many bytes they consumed, so
//! callers thread their own position through each step.

use crate::error::{Error, Result};

/// Longest encoding accepted for a 64-bit value.
///
/// Ten 7-bit groups cover 70 bits. The tenth byte lands at shift 63, so the
/// shift never reaches the width of a `u64`.
pub const MAX_ULEB128_LEN: usize = 10;

/// Reads an unsigned LEB128 value at `offset`.
///
/// Returns `(value, bytes_consumed)`.
///
/// # Performance
///
/// Single and two byte encodings take a fast path without a loop. Most
/// terminal sizes, flags and child offsets are that small.
///
/// # Errors
///
/// [`Error::Truncated`] if the data ends before a byte with the high bit clear,
/// [`Error::Uleb128TooLong`] if that byte would be the eleventh.
#[inline(always)]
pub fn read_uleb128(data: &[u8], offset: usize) -> Result<(u64, usize)> {
    let bytes = data
        .get(offset..)
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| Error::truncated(offset, data.len()))?;

    let b0 = bytes[0];
    if b0 < 0x80 {
        return Ok((b0 as u64, 1));
    }

    if let Some(&b1) = bytes.get(1) {
        if b1 < 0x80 {
            return Ok((((b0 & 0x7F) as u64) | ((b1 as u64) << 7), 2));
        }
    }

    let mut result: u64 = 0;
    let mut shift = 0u32;

    for (i, &byte) in bytes.iter().take(MAX_ULEB128_LEN).enumerate() {
        // Bits past the 64th are dropped.
        result |= ((byte & 0x7F) as u64) << shift;

        if byte < 0x80 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }

    if bytes.len() < MAX_ULEB128_LEN {
        Err(Error::truncated(offset + bytes.len(), data.len()))
    } else {
        Err(Error::Uleb128TooLong {
            offset,
            max: MAX_ULEB128_LEN,
        })
    }
}

/// Skips over an unsigned LEB128 value at `offset` without decoding it.
///
/// Returns the number of bytes the encoding occupies. Errors match
/// [`read_uleb128`].
#[inline]
pub fn skip_uleb128(data: &[u8], offset: usize) -> Result<usize> {
    let bytes = data.get(offset..).unwrap_or_default();

    match bytes
        .iter()
        .take(MAX_ULEB128_LEN)
        .position(|&byte| byte < 0x80)
    {
        Some(last) => Ok(last + 1),
        None if bytes.len() < MAX_ULEB128_LEN => {
            Err(Error::truncated(offset + bytes.len(), data.len()))
        }
        None => Err(Error::Uleb128TooLong {
            offset,
            max: MAX_ULEB128_LEN,
        }),
    }
}

/// Writes an unsigned LEB128 value to a buffer.
pub fn write_uleb128(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}
