//! Pattern automaton: arena-backed trie, failure-link compiler, and the
//! scan/plan/replace pipeline built on top of it.
//!
//! Purpose: compile a set of (pattern, replacement) rules once into a
//! read-only Aho-Corasick automaton, then rewrite any number of inputs
//! against it without touching the compiled state.
//!
//! # Algorithm
//! 1. Registration grows a trie in a fixed-capacity node arena.
//! 2. [`Automaton::compile`] runs the failure-link BFS and derives the
//!    scanner's root-byte fast path table.
//! 3. Each rewrite scans linearly, plans a non-overlapping leftmost-wins
//!    schedule, then splices output (allocating or in place).
//!
//! # Invariants
//! - The automaton is immutable after [`Automaton::compile`]; scanning and
//!   replacing take `&self` and all per-invocation scratch lives with the
//!   invocation, so one compiled automaton is freely shareable across
//!   threads.
//! - The node arena is contiguous and capacity-fixed at creation; running
//!   out of slots is an error, never a growth signal.
//! - Pattern and replacement bytes are borrowed (`&'p [u8]`), never copied;
//!   the borrow checker holds the host to the keep-alive contract.
//! - After compilation every non-root node has a failure link to a strictly
//!   shallower node, and output links shortcut to the nearest terminal on
//!   the failure chain.

use crate::api::{Error, Stats};

mod plan;
mod replace;
mod scan;

#[cfg(test)]
mod tests;

#[cfg(feature = "stats")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Arena capacity used when `Automaton::new` is given `0`.
pub const DEFAULT_NODE_CAPACITY: usize = 1024;

/// Child/link sentinel for "no node". Kept private; the public face of a
/// node reference is [`crate::NodeId`].
pub(crate) const NO_NODE: u32 = u32::MAX;

/// Arena index of the root. The root is allocated first and survives reset.
pub(crate) const ROOT: u32 = 0;

/// One trie node. Sized for cache-friendly arena storage: all references are
/// dense `u32` arena indices rather than pointers.
pub(crate) struct Node<'p, T> {
    /// Child table indexed by byte value; `NO_NODE` where absent.
    pub(crate) children: [u32; 256],
    /// Deepest proper suffix of this node's path that is itself a path from
    /// root. Valid only after compilation; the root fails to itself.
    pub(crate) failure: u32,
    /// Nearest terminal on the failure chain, or `NO_NODE`.
    pub(crate) output: u32,
    /// Whether a registered pattern ends here.
    pub(crate) terminal: bool,
    /// The registered pattern ending at this node; empty at interior nodes.
    /// The slice length doubles as the cached pattern length.
    pub(crate) pattern: &'p [u8],
    /// Static replacement bytes, if registered.
    pub(crate) replacement: Option<&'p [u8]>,
    /// Opaque per-pattern user data, if registered. Never inspected by the
    /// engine; handed back to replacement callbacks by reference.
    pub(crate) user_data: Option<T>,
}

impl<'p, T> Node<'p, T> {
    fn new() -> Self {
        Node {
            children: [NO_NODE; 256],
            failure: NO_NODE,
            output: NO_NODE,
            terminal: false,
            pattern: &[],
            replacement: None,
            user_data: None,
        }
    }
}

/// Multi-pattern substitution automaton.
///
/// `'p` is the lifetime of the registered pattern and replacement bytes;
/// `T` is opaque per-pattern user data handed to replacement callbacks
/// (default `()`).
///
/// Lifecycle: [`new`](Self::new), any number of
/// [`register`](Self::register) calls, [`compile`](Self::compile), then any
/// number of scans and replaces. [`reset`](Self::reset) returns to the empty
/// pre-compile state.
pub struct Automaton<'p, T = ()> {
    pub(crate) nodes: Vec<Node<'p, T>>,
    capacity: usize,
    compiled: bool,
    /// Bytes with a root child, rebuilt at compile time. Drives the
    /// `memchr`-family skip while the scanner sits in the root state.
    pub(crate) root_bytes: Vec<u8>,
    #[cfg(feature = "stats")]
    pub(crate) counters: Counters,
}

impl<'p, T> Automaton<'p, T> {
    /// Create an automaton with a fixed node arena.
    ///
    /// A `capacity` of 0 selects [`DEFAULT_NODE_CAPACITY`]. One slot is
    /// consumed immediately by the root, leaving room for `capacity - 1`
    /// new trie edges in the worst case.
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_NODE_CAPACITY
        } else {
            capacity
        };
        let mut nodes = Vec::with_capacity(capacity);
        nodes.push(Node::new());
        Automaton {
            nodes,
            capacity,
            compiled: false,
            root_bytes: Vec::new(),
            #[cfg(feature = "stats")]
            counters: Counters::default(),
        }
    }

    /// Register `pattern` with a static replacement.
    ///
    /// Registering an existing pattern overwrites its binding
    /// (last-writer-wins). Any registration invalidates a prior compilation,
    /// so the set may be amended and recompiled at any time.
    ///
    /// # Errors
    /// - [`Error::EmptyPattern`] for a zero-length pattern.
    /// - [`Error::ArenaFull`] when a new trie node would exceed the arena.
    pub fn register(&mut self, pattern: &'p [u8], replacement: &'p [u8]) -> Result<(), Error> {
        self.register_with_data(pattern, Some(replacement), None)
    }

    /// Register `pattern` with an optional static replacement and optional
    /// user data.
    ///
    /// A pattern registered with neither replacement nor user data is
    /// deleted wherever it matches. User data is stored verbatim on the
    /// terminal node and handed to [`replace_with`](Self::replace_with)
    /// callbacks by reference.
    ///
    /// # Errors
    /// See [`register`](Self::register).
    pub fn register_with_data(
        &mut self,
        pattern: &'p [u8],
        replacement: Option<&'p [u8]>,
        user_data: Option<T>,
    ) -> Result<(), Error> {
        if pattern.is_empty() {
            return Err(Error::EmptyPattern);
        }

        // Invalidate up front: a failed registration may still have grown
        // the trie, and stale links must not survive into a scan.
        self.compiled = false;

        let mut current = ROOT;
        for &b in pattern {
            let slot = self.nodes[current as usize].children[b as usize];
            current = if slot != NO_NODE {
                slot
            } else {
                let id = self.alloc_node()?;
                self.nodes[current as usize].children[b as usize] = id;
                id
            };
        }

        let node = &mut self.nodes[current as usize];
        node.terminal = true;
        node.pattern = pattern;
        node.replacement = replacement;
        node.user_data = user_data;
        Ok(())
    }

    /// Build failure and output links, freezing the automaton for scanning.
    ///
    /// Breadth-first over the trie: depth-1 nodes fail to the root; a child
    /// `v` of `u` under byte `b` fails to the first node on `u`'s failure
    /// chain with a child on `b` (or the root). Output links shortcut to the
    /// nearest terminal on the failure chain.
    ///
    /// # Errors
    /// - [`Error::AlreadyCompiled`] when called twice without a reset.
    pub fn compile(&mut self) -> Result<(), Error> {
        if self.compiled {
            return Err(Error::AlreadyCompiled);
        }

        let mut queue = std::collections::VecDeque::with_capacity(self.nodes.len());

        for b in 0..256 {
            let child = self.nodes[ROOT as usize].children[b];
            if child != NO_NODE {
                self.nodes[child as usize].failure = ROOT;
                self.nodes[child as usize].output = NO_NODE;
                queue.push_back(child);
            }
        }

        while let Some(u) = queue.pop_front() {
            for b in 0..256 {
                let v = self.nodes[u as usize].children[b];
                if v == NO_NODE {
                    continue;
                }
                queue.push_back(v);

                // Walk u's failure chain to the first node with a child on
                // b. u was dequeued, so its own link is already final.
                let mut f = self.nodes[u as usize].failure;
                let vf = loop {
                    let c = self.nodes[f as usize].children[b];
                    if c != NO_NODE {
                        break c;
                    }
                    if f == ROOT {
                        break ROOT;
                    }
                    f = self.nodes[f as usize].failure;
                };

                self.nodes[v as usize].failure = vf;
                self.nodes[v as usize].output = if self.nodes[vf as usize].terminal {
                    vf
                } else {
                    self.nodes[vf as usize].output
                };
            }
        }

        self.nodes[ROOT as usize].failure = ROOT;
        self.root_bytes = (0u16..256)
            .filter(|&b| self.nodes[ROOT as usize].children[b as usize] != NO_NODE)
            .map(|b| b as u8)
            .collect();
        self.compiled = true;
        Ok(())
    }

    /// Whether [`compile`](Self::compile) has run since the last mutation.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Return the automaton to its empty pre-compile state.
    ///
    /// All registered patterns are forgotten and the root is recreated; the
    /// arena capacity is retained.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::new());
        self.root_bytes.clear();
        self.compiled = false;
    }

    /// Structural statistics: node count, pattern count, and an estimate of
    /// resident bytes (the full arena capacity counts whether used or not).
    pub fn stats(&self) -> Stats {
        Stats {
            nodes: self.nodes.len(),
            patterns: self.nodes.iter().filter(|n| n.terminal).count(),
            bytes: std::mem::size_of::<Self>()
                + self.capacity * std::mem::size_of::<Node<'p, T>>(),
        }
    }

    /// The arena capacity fixed at creation.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the cumulative engine counters.
    #[cfg(feature = "stats")]
    pub fn counters(&self) -> crate::api::CountersSnapshot {
        self.counters.snapshot()
    }

    fn alloc_node(&mut self) -> Result<u32, Error> {
        if self.nodes.len() >= self.capacity {
            return Err(Error::ArenaFull {
                capacity: self.capacity,
            });
        }
        let id = self.nodes.len() as u32;
        self.nodes.push(Node::new());
        Ok(id)
    }

    #[inline]
    pub(crate) fn node(&self, id: u32) -> &Node<'p, T> {
        &self.nodes[id as usize]
    }

    /// Guard shared by every post-compile operation.
    #[inline]
    pub(crate) fn require_compiled(&self) -> Result<(), Error> {
        if self.compiled {
            Ok(())
        } else {
            Err(Error::NotCompiled)
        }
    }
}

/// Cumulative engine counters. Relaxed atomics: the counters are
/// monotonically increasing telemetry, not synchronization.
#[cfg(feature = "stats")]
#[derive(Default)]
pub(crate) struct Counters {
    pub(crate) scans: AtomicU64,
    pub(crate) matches: AtomicU64,
    pub(crate) replacements: AtomicU64,
    pub(crate) bytes_in: AtomicU64,
    pub(crate) bytes_out: AtomicU64,
}

#[cfg(feature = "stats")]
impl Counters {
    pub(crate) fn record_scan(&self, matches: usize) {
        self.scans.fetch_add(1, Ordering::Relaxed);
        self.matches.fetch_add(matches as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_replace(&self, applied: usize, bytes_in: usize, bytes_out: usize) {
        self.replacements.fetch_add(applied as u64, Ordering::Relaxed);
        self.bytes_in.fetch_add(bytes_in as u64, Ordering::Relaxed);
        self.bytes_out.fetch_add(bytes_out as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> crate::api::CountersSnapshot {
        crate::api::CountersSnapshot {
            scans: self.scans.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            replacements: self.replacements.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
        }
    }
}
