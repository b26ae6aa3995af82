//! Replacement engine: materialize a planned substitution schedule.
//!
//! Two modes share the scan and plan passes and diverge only at the splice:
//! the allocating mode walks the schedule forward into a fresh buffer, the
//! in-place mode walks it backward inside the caller's buffer so unapplied
//! offsets stay valid without recomputation.
//!
//! # Invariants
//! - The allocating mode never mutates its input and sizes the output
//!   buffer exactly before writing.
//! - The in-place mode never writes past the buffer capacity; a
//!   substitution that would overflow is skipped, not truncated.
//! - Replacement callbacks run exactly once per kept match and never for
//!   occurrences discarded by the leftmost-wins selection.

use std::ops::ControlFlow;

use crate::api::{Error, InplaceOutcome, Match, NodeId, Rewritten};
use crate::engine::plan::{MatchList, RawMatch};
use crate::engine::Automaton;

impl<'p, T> Automaton<'p, T> {
    /// Rewrite `text` into a fresh buffer using static replacements.
    ///
    /// A matched pattern registered without a static replacement is deleted.
    /// When nothing matches, the result is a copy of the input with
    /// `replaced == 0`.
    ///
    /// # Errors
    /// - [`Error::NotCompiled`] if [`compile`](Self::compile) has not run.
    pub fn replace_alloc(&self, text: &[u8]) -> Result<Rewritten, Error> {
        let mut list = self.collect(text)?;
        let kept = list.plan();
        let schedule = &list.as_slice()[..kept];

        let mut total = text.len();
        for m in schedule {
            total = total - m.pattern_len() + self.static_replacement(m).len();
        }

        let mut out = Vec::with_capacity(total);
        let mut pos = 0usize;
        for m in schedule {
            out.extend_from_slice(&text[pos..m.start]);
            out.extend_from_slice(self.static_replacement(m));
            pos = m.end + 1;
        }
        out.extend_from_slice(&text[pos..]);

        #[cfg(feature = "stats")]
        self.counters.record_replace(kept, text.len(), out.len());
        Ok(Rewritten {
            bytes: out,
            replaced: kept,
        })
    }

    /// Rewrite `text` into a fresh buffer, resolving each kept match through
    /// `resolve`.
    ///
    /// The callback sees the full [`Match`] (pattern bytes, static
    /// replacement if any, user data if any) and returns the replacement
    /// bytes; an empty return deletes the match. Invocation context --
    /// request attributes, environment, nonce state -- is whatever the
    /// closure captures. The callback runs exactly once per kept match, in
    /// ascending text order, and never for occurrences discarded by the
    /// leftmost-wins selection.
    ///
    /// # Errors
    /// - [`Error::NotCompiled`] if [`compile`](Self::compile) has not run.
    pub fn replace_with<F>(&self, text: &[u8], mut resolve: F) -> Result<Rewritten, Error>
    where
        F: FnMut(&Match<'_, T>) -> Vec<u8>,
    {
        let mut list = self.collect(text)?;
        let kept = list.plan();
        let schedule = &list.as_slice()[..kept];

        // Resolve every kept match up front; the cached bytes both size the
        // output and feed the splice.
        let mut resolved: Vec<Vec<u8>> = Vec::with_capacity(kept);
        let mut total = text.len();
        for m in schedule {
            let bytes = resolve(&self.public_match(m));
            total = total - m.pattern_len() + bytes.len();
            resolved.push(bytes);
        }

        let mut out = Vec::with_capacity(total);
        let mut pos = 0usize;
        for (m, bytes) in schedule.iter().zip(&resolved) {
            out.extend_from_slice(&text[pos..m.start]);
            out.extend_from_slice(bytes);
            pos = m.end + 1;
        }
        out.extend_from_slice(&text[pos..]);

        #[cfg(feature = "stats")]
        self.counters.record_replace(kept, text.len(), out.len());
        Ok(Rewritten {
            bytes: out,
            replaced: kept,
        })
    }

    /// Rewrite `buf[..len]` in place using static replacements, bounded by
    /// the buffer capacity (`buf.len()`).
    ///
    /// The schedule is applied right to left so earlier offsets stay valid
    /// while later text shifts. A substitution whose result would exceed the
    /// capacity is skipped and not counted. Returns the new content length
    /// and the number of substitutions applied.
    ///
    /// # Panics
    /// Panics if `len > buf.len()`.
    ///
    /// # Errors
    /// - [`Error::NotCompiled`] if [`compile`](Self::compile) has not run.
    pub fn replace_inplace(&self, buf: &mut [u8], len: usize) -> Result<InplaceOutcome, Error> {
        assert!(
            len <= buf.len(),
            "content length {len} exceeds buffer capacity {}",
            buf.len()
        );
        let capacity = buf.len();

        let mut list = self.collect(&buf[..len])?;
        let kept = list.plan();
        let schedule = &list.as_slice()[..kept];

        let mut current_len = len;
        let mut applied = 0usize;
        for m in schedule.iter().rev() {
            // Stale after a prior shrink.
            if m.end >= current_len {
                continue;
            }
            let replacement = self.static_replacement(m);
            if current_len - m.pattern_len() + replacement.len() > capacity {
                continue;
            }
            buf.copy_within(m.end + 1..current_len, m.start + replacement.len());
            buf[m.start..m.start + replacement.len()].copy_from_slice(replacement);
            current_len = current_len - m.pattern_len() + replacement.len();
            applied += 1;
        }

        #[cfg(feature = "stats")]
        self.counters.record_replace(applied, len, current_len);
        Ok(InplaceOutcome {
            new_len: current_len,
            replaced: applied,
        })
    }

    /// Scan `text` and collect every raw occurrence.
    fn collect(&self, text: &[u8]) -> Result<MatchList, Error> {
        let mut list = MatchList::new();
        self.scan(text, |m| {
            list.push(RawMatch {
                start: m.start,
                end: m.end,
                node: m.node.0,
            });
            ControlFlow::Continue(())
        })?;
        Ok(list)
    }

    #[inline]
    fn static_replacement(&self, m: &RawMatch) -> &'p [u8] {
        self.node(m.node).replacement.unwrap_or(&[])
    }

    fn public_match(&self, m: &RawMatch) -> Match<'_, T> {
        let node = self.node(m.node);
        Match {
            start: m.start,
            end: m.end,
            pattern: node.pattern,
            replacement: node.replacement,
            user_data: node.user_data.as_ref(),
            node: NodeId(m.node),
        }
    }
}
