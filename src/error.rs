//! Error types for export trie decoding.
//!
//! Every error here means the trie bytes are malformed or unsupported. A symbol
//! that is simply absent from the trie is reported as `Ok(None)`, never as an error.

use thiserror::Error;

/// The main error type for export trie operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ==================== Truncation ====================
    #[error("unexpected end of trie data at offset {offset:#x} (trie size: {len:#x})")]
    Truncated { offset: usize, len: usize },

    #[error("ULEB128 at offset {offset:#x} is longer than {max} bytes")]
    Uleb128TooLong { offset: usize, max: usize },

    #[error("unterminated string at offset {offset:#x} (trie size: {len:#x})")]
    UnterminatedString { offset: usize, len: usize },

    // ==================== Structure ====================
    #[error("{what} offset {offset:#x} out of range (trie size: {len:#x})")]
    OffsetOutOfRange {
        what: &'static str,
        offset: u64,
        len: usize,
    },

    #[error("child node at {child:#x} does not follow its parent at {parent:#x}")]
    NonAdvancingNode { parent: usize, child: usize },

    #[error("empty edge label at offset {offset:#x}")]
    EmptyEdge { offset: usize },

    #[error("edge at offset {offset:#x} matched no symbol bytes (matched so far: {matched})")]
    NonAdvancingMatch { offset: usize, matched: usize },

    #[error("export trie exceeds the limit of {limit} nodes")]
    NodeLimitExceeded { limit: usize },
}

/// A specialized Result type for export trie operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the trie offset the error refers to, if it names one.
    pub fn offset(&self) -> Option<usize> {
        match *self {
            Error::Truncated { offset, .. }
            | Error::Uleb128TooLong { offset, .. }
            | Error::UnterminatedString { offset, .. }
            | Error::EmptyEdge { offset }
            | Error::NonAdvancingMatch { offset, .. } => Some(offset),
            Error::OffsetOutOfRange { offset, .. } => usize::try_from(offset).ok(),
            Error::NonAdvancingNode { child, .. } => Some(child),
            Error::NodeLimitExceeded { .. } => None,
        }
    }

    /// Returns true if the input ended before a complete field was read.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        matches!(
            self,
            Error::Truncated { .. } | Error::UnterminatedString { .. }
        )
    }

    /// Creates a truncation error.
    #[inline]
    pub fn truncated(offset: usize, len: usize) -> Self {
        Error::Truncated { offset, len }
    }

    /// Creates an out-of-range error for the named field.
    #[inline]
    pub fn out_of_range(what: &'static str, offset: u64, len: usize) -> Self {
        Error::OffsetOutOfRange { what, offset, len }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(Error::truncated(0x10, 0x10).offset(), Some(0x10));
        assert_eq!(Error::out_of_range("child", 0x40, 8).offset(), Some(0x40));
        assert_eq!(
            Error::NonAdvancingNode {
                parent: 0x20,
                child: 0x8
            }
            .offset(),
            Some(0x8)
        );
        assert_eq!(Error::EmptyEdge { offset: 0x13 }.offset(), Some(0x13));
        assert_eq!(Error::NodeLimitExceeded { limit: 4 }.offset(), None);
    }

    #[test]
    fn test_display() {
        let err = Error::out_of_range("child node", 0x99, 0x20);
        assert_eq!(
            err.to_string(),
            "child node offset 0x99 out of range (trie size: 0x20)"
        );
        assert!(Error::UnterminatedString { offset: 1, len: 2 }.is_truncated());
        assert!(!err.is_truncated());
    }
}
