//! Exported symbol records and terminal node parsing.
//!
//! A terminal node carries a ULEB128 flags value followed by a payload whose
//! shape depends on which flag bits are set:
//!
//! - re-export: library ordinal, then the NUL-terminated name in that library
//! - stored value: the symbol address (a placeholder for re-exports)
//! - stub and resolver: the resolver function offset
//!
//! The payload is parsed strictly by bit, so any combination of bits decodes.

use std::fmt;

use bitflags::bitflags;

use super::varint::read_uleb128;
use crate::error::{Error, Result};
use crate::util::read_cstr;

// =============================================================================
// Export Flags
// =============================================================================

/// Export symbol kind mask.
pub const EXPORT_SYMBOL_FLAGS_KIND_MASK: u64 = 0x03;

/// Regular export.
pub const EXPORT_SYMBOL_FLAGS_KIND_REGULAR: u64 = 0x00;

/// Thread-local variable.
pub const EXPORT_SYMBOL_FLAGS_KIND_THREAD_LOCAL: u64 = 0x01;

/// Absolute symbol (not relative to any section).
pub const EXPORT_SYMBOL_FLAGS_KIND_ABSOLUTE: u64 = 0x02;

bitflags! {
    /// Flags of a terminal trie node.
    ///
    /// The low two bits are the [`ExportKind`] field rather than independent
    /// bits. Unknown bits are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ExportFlags: u64 {
        /// Kind field, low bit
        const KIND_THREAD_LOCAL = EXPORT_SYMBOL_FLAGS_KIND_THREAD_LOCAL;
        /// Kind field, high bit
        const KIND_ABSOLUTE = EXPORT_SYMBOL_FLAGS_KIND_ABSOLUTE;
        /// Weak definition
        const WEAK_DEFINITION = 0x04;
        /// Re-export from another dylib
        const REEXPORT = 0x08;
        /// Stub with a lazily called resolver
        const STUB_AND_RESOLVER = 0x10;
        /// Resolver called at load time
        const STATIC_RESOLVER = 0x20;

        const _ = !0;
    }
}

/// The kind field of [`ExportFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    /// Address relative to the image base
    Regular,
    /// Thread-local variable descriptor, relative to the image base
    ThreadLocal,
    /// Absolute value, never rebased
    Absolute,
    /// Kind value 3, unassigned
    Reserved,
}

impl ExportFlags {
    /// Creates flags from a raw trie value, keeping every bit.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self::from_bits_retain(raw)
    }

    /// Returns the symbol kind.
    #[inline]
    pub fn kind(self) -> ExportKind {
        match self.bits() & EXPORT_SYMBOL_FLAGS_KIND_MASK {
            EXPORT_SYMBOL_FLAGS_KIND_REGULAR => ExportKind::Regular,
            EXPORT_SYMBOL_FLAGS_KIND_THREAD_LOCAL => ExportKind::ThreadLocal,
            EXPORT_SYMBOL_FLAGS_KIND_ABSOLUTE => ExportKind::Absolute,
            _ => ExportKind::Reserved,
        }
    }

    /// Returns true for the regular kind.
    #[inline]
    pub fn is_regular(self) -> bool {
        self.kind() == ExportKind::Regular
    }

    /// Returns true for the thread-local kind.
    #[inline]
    pub fn is_thread_local(self) -> bool {
        self.kind() == ExportKind::ThreadLocal
    }

    /// Returns true if this is a weak definition.
    #[inline]
    pub fn is_weak(self) -> bool {
        self.contains(Self::WEAK_DEFINITION)
    }

    /// Returns true if this is a re-export.
    #[inline]
    pub fn is_reexport(self) -> bool {
        self.contains(Self::REEXPORT)
    }

    /// Returns true if this is a stub with resolver.
    #[inline]
    pub fn is_stub_and_resolver(self) -> bool {
        self.contains(Self::STUB_AND_RESOLVER)
    }

    /// Returns true if the stored value must have the load address added.
    ///
    /// Regular and thread-local values are image relative. A re-export's value
    /// is a placeholder and is reported as stored.
    #[inline]
    pub fn rebases(self) -> bool {
        (self.is_regular() || self.is_thread_local()) && !self.is_reexport()
    }
}

impl fmt::Display for ExportFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind() {
            ExportKind::Regular => "regular",
            ExportKind::ThreadLocal => "thread_local",
            ExportKind::Absolute => "absolute",
            ExportKind::Reserved => "reserved",
        };
        f.write_str(kind)?;

        for (flag, label) in [
            (Self::WEAK_DEFINITION, "weak"),
            (Self::REEXPORT, "reexport"),
            (Self::STUB_AND_RESOLVER, "stub_and_resolver"),
            (Self::STATIC_RESOLVER, "static_resolver"),
        ] {
            if self.contains(flag) {
                write!(f, "|{}", label)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Symbol Entry
// =============================================================================

/// An exported symbol decoded from a terminal node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Symbol name, with ` (<target>)` appended for renamed re-exports
    pub name: String,
    /// Export flags
    pub flags: ExportFlags,
    /// Symbol address, rebased when [`ExportFlags::rebases`] holds
    pub address: u64,
    /// Resolver offset for stub-and-resolver, library ordinal for re-exports, else 0
    pub other: u64,
    /// For re-exports: ordinal of the source dylib
    pub reexport_ordinal: Option<u64>,
    /// For re-exports: symbol name in the source dylib (if different)
    pub reexport_name: Option<String>,
    /// For stub+resolver: resolver function offset
    pub resolver_offset: Option<u64>,
    /// Install name of the dylib a re-export comes from, filled by
    /// [`resolve_reexport_dylibs`]
    pub found_in_dylib: Option<String>,
}

impl fmt::Display for SymbolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.found_in_dylib {
            Some(dylib) => write!(f, "0x{:8x}: {}, {}", self.address, self.name, dylib),
            None => write!(f, "0x{:8x}: {}", self.address, self.name),
        }
    }
}

/// Parses the terminal payload of a node.
///
/// `info_offset` is where the payload starts (just past the node's terminal
/// size) and `terminal_size` its length. All reads stay within the payload.
/// `prefix` is the node's accumulated name.
pub fn parse_terminal(
    data: &[u8],
    info_offset: usize,
    terminal_size: u64,
    prefix: &[u8],
    load_address: u64,
) -> Result<SymbolEntry> {
    let end = usize::try_from(terminal_size)
        .ok()
        .and_then(|size| info_offset.checked_add(size))
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            Error::out_of_range(
                "terminal payload end",
                (info_offset as u64).saturating_add(terminal_size),
                data.len(),
            )
        })?;
    let payload = &data[..end];

    let (raw_flags, bytes) = read_uleb128(payload, info_offset)?;
    let flags = ExportFlags::from_raw(raw_flags);
    let mut cursor = info_offset + bytes;

    let mut reexport_ordinal = None;
    let mut reexport_name = None;
    if flags.is_reexport() {
        let (ordinal, bytes) = read_uleb128(payload, cursor)?;
        cursor += bytes;
        reexport_ordinal = Some(ordinal);

        let (imported, next) = read_cstr(payload, cursor)?;
        cursor = next;
        if !imported.is_empty() {
            reexport_name = Some(String::from_utf8_lossy(imported).into_owned());
        }
    }

    // Re-exports emitted by the linker end after the imported name.
    let mut value = 0;
    if !flags.is_reexport() || cursor < end {
        let (stored, bytes) = read_uleb128(payload, cursor)?;
        cursor += bytes;
        value = stored;
    }

    let mut resolver_offset = None;
    if flags.is_stub_and_resolver() {
        let (resolver, _) = read_uleb128(payload, cursor)?;
        resolver_offset = Some(resolver);
    }

    if flags.rebases() {
        value = value.wrapping_add(load_address);
    }

    let prefix = String::from_utf8_lossy(prefix);
    let name = match &reexport_name {
        Some(imported) => format!("{} ({})", prefix, imported),
        None => prefix.into_owned(),
    };

    Ok(SymbolEntry {
        name,
        flags,
        address: value,
        other: resolver_offset.or(reexport_ordinal).unwrap_or(0),
        reexport_ordinal,
        reexport_name,
        resolver_offset,
        found_in_dylib: None,
    })
}

/// Parses the node at `node_offset` as a terminal node named `name`.
///
/// Returns `Ok(None)` if the node carries no export information. This is the
/// second half of a lookup: the walker finds the offset, this extracts the record.
pub fn parse_entry_at(
    data: &[u8],
    node_offset: usize,
    name: &[u8],
    load_address: u64,
) -> Result<Option<SymbolEntry>> {
    if node_offset >= data.len() {
        return Err(Error::out_of_range("node", node_offset as u64, data.len()));
    }

    let (terminal_size, bytes) = read_uleb128(data, node_offset)?;
    if terminal_size == 0 {
        return Ok(None);
    }

    parse_terminal(
        data,
        node_offset + bytes,
        terminal_size,
        name,
        load_address,
    )
    .map(Some)
}

/// Fills [`SymbolEntry::found_in_dylib`] for re-exports.
///
/// `dylibs` lists the image's dependent libraries in load command order; the
/// re-export ordinal is a 1-based index into it. Entries whose ordinal has no
/// matching library are left untouched.
pub fn resolve_reexport_dylibs<S: AsRef<str>>(entries: &mut [SymbolEntry], dylibs: &[S]) {
    for entry in entries.iter_mut() {
        let Some(ordinal) = entry.reexport_ordinal else {
            continue;
        };
        let dylib = usize::try_from(ordinal)
            .ok()
            .and_then(|ordinal| ordinal.checked_sub(1))
            .and_then(|index| dylibs.get(index));
        if let Some(dylib) = dylib {
            entry.found_in_dylib = Some(dylib.as_ref().to_string());
        }
    }
}
