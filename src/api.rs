//! Public API data types for the substitution engine.
//!
//! Purpose: the shared error, match, and result structs used by the engine
//! and its callers. These types are intentionally behavior-free; validation
//! and enforcement happen in the engine.
//!
//! # Invariants
//! - [`NodeId`] is an opaque dense index; it is only valid for the automaton
//!   that produced it and only until that automaton is reset.
//! - A [`Match`] is only meaningful for the text it was reported against:
//!   `end - start + 1 == pattern.len()` and `text[start..=end] == pattern`.

use std::fmt;
use std::ops::Range;

/// Errors returned by automaton construction and use.
///
/// Misuse (scanning before compile, compiling twice) and resource exhaustion
/// (a full node arena) are both reported here; neither is recoverable by the
/// engine itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A scan or replace operation was invoked before [`compile`].
    ///
    /// [`compile`]: crate::Automaton::compile
    NotCompiled,
    /// [`compile`] was called twice without an intervening reset.
    ///
    /// [`compile`]: crate::Automaton::compile
    AlreadyCompiled,
    /// A zero-length pattern was registered.
    EmptyPattern,
    /// Registering the pattern would exceed the fixed node arena.
    ///
    /// The arena never grows; callers that cannot bound their pattern set
    /// up-front must create the automaton with a larger capacity.
    ArenaFull {
        /// The arena capacity fixed at creation time.
        capacity: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotCompiled => write!(f, "automaton has not been compiled"),
            Error::AlreadyCompiled => write!(f, "automaton is already compiled"),
            Error::EmptyPattern => write!(f, "patterns must be at least one byte long"),
            Error::ArenaFull { capacity } => {
                write!(f, "node arena full (capacity {capacity})")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Dense node index into an automaton's arena.
///
/// Stable for the lifetime of the automaton (until reset). Exposed for
/// diagnostics; there is no public way to dereference one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The arena slot this id names.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single pattern occurrence reported by a scan.
///
/// Offsets are byte positions in the scanned text; `end` is inclusive, so
/// `text[start..=end]` equals `pattern`. The pattern and replacement slices
/// are the exact bytes the host registered, by reference.
#[derive(Debug)]
pub struct Match<'a, T = ()> {
    /// Byte offset of the first pattern byte.
    pub start: usize,
    /// Byte offset of the last pattern byte (inclusive).
    pub end: usize,
    /// The registered pattern that matched.
    pub pattern: &'a [u8],
    /// Static replacement bytes, if the pattern was registered with any.
    pub replacement: Option<&'a [u8]>,
    /// Per-pattern user data, if the pattern was registered with any.
    pub user_data: Option<&'a T>,
    /// Terminal node that ends this pattern.
    pub node: NodeId,
}

impl<'a, T> Match<'a, T> {
    /// The matched span as a half-open byte range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end + 1
    }
}

impl<'a, T> Clone for Match<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

// Manual impl: `Match` only holds references to `T`, so it is `Copy` even
// when `T` is not.
impl<'a, T> Copy for Match<'a, T> {}

/// Result of an allocating replacement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rewritten {
    /// The rewritten text. Equal to the input when `replaced == 0`.
    pub bytes: Vec<u8>,
    /// Number of substitutions applied.
    pub replaced: usize,
}

/// Result of an in-place replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InplaceOutcome {
    /// Length of the rewritten content; `buf[..new_len]` is the result.
    pub new_len: usize,
    /// Number of substitutions applied. Substitutions that would overflow
    /// the buffer capacity are skipped, not counted.
    pub replaced: usize,
}

/// Structural statistics for a pattern automaton.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Nodes allocated in the arena, including the root.
    pub nodes: usize,
    /// Terminal nodes (distinct registered patterns).
    pub patterns: usize,
    /// Estimated resident bytes: the automaton struct plus the full arena
    /// capacity, whether or not it is in use.
    pub bytes: usize,
}

/// Cumulative engine counters, snapshotted from atomics.
///
/// Only collected when the `stats` cargo feature is enabled.
#[cfg(feature = "stats")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    /// Completed scan passes (including those driven by replace operations).
    pub scans: u64,
    /// Raw matches emitted across all scans.
    pub matches: u64,
    /// Substitutions actually applied across all replace operations.
    pub replacements: u64,
    /// Input bytes consumed by replace operations.
    pub bytes_in: u64,
    /// Output bytes produced by replace operations.
    pub bytes_out: u64,
}
