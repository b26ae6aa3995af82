//! Linear scan over input text, reporting every pattern occurrence.
//!
//! State machine straight from the automaton: follow the child edge for the
//! current byte, falling back along failure links until one exists or the
//! root is reached; then walk the output chain to emit every pattern ending
//! at this position (deepest terminal first).
//!
//! # Invariants
//! - No byte of the input is examined more than a constant number of times;
//!   the whole scan is O(text + matches).
//! - Scanning never mutates the automaton and never allocates.
//! - While the state machine sits in the root state, bytes without a root
//!   child can be skipped wholesale: they cannot advance the automaton or
//!   end a match. The skip uses `memchr`/`memchr2`/`memchr3` when the root
//!   has at most three distinct child bytes and is behaviorally invisible.

use std::ops::ControlFlow;

use crate::api::{Error, Match, NodeId};
use crate::engine::{Automaton, NO_NODE, ROOT};

impl<'p, T> Automaton<'p, T> {
    /// Scan `text`, invoking `on_match` for every occurrence of every
    /// registered pattern, overlaps included.
    ///
    /// Occurrences are reported in increasing end-position order; patterns
    /// ending at the same position are reported deepest (longest) first,
    /// following the output chain. Returning `ControlFlow::Break(())` stops
    /// the scan early; the returned count includes the stopping match.
    ///
    /// # Errors
    /// - [`Error::NotCompiled`] if [`compile`](Self::compile) has not run.
    pub fn scan<F>(&self, text: &[u8], mut on_match: F) -> Result<usize, Error>
    where
        F: FnMut(Match<'_, T>) -> ControlFlow<()>,
    {
        self.require_compiled()?;

        let mut state = ROOT;
        let mut count = 0usize;
        let mut i = 0usize;

        while i < text.len() {
            if state == ROOT {
                match self.skip_from_root(text, i) {
                    Some(next) => i = next,
                    None => break,
                }
            }

            let b = text[i];
            loop {
                let child = self.node(state).children[b as usize];
                if child != NO_NODE {
                    state = child;
                    break;
                }
                if state == ROOT {
                    break;
                }
                state = self.node(state).failure;
            }

            // Every terminal on the output chain ends a pattern at i.
            let mut t = if self.node(state).terminal {
                state
            } else {
                self.node(state).output
            };
            while t != NO_NODE {
                let node = self.node(t);
                count += 1;
                let m = Match {
                    start: i + 1 - node.pattern.len(),
                    end: i,
                    pattern: node.pattern,
                    replacement: node.replacement,
                    user_data: node.user_data.as_ref(),
                    node: NodeId(t),
                };
                if on_match(m).is_break() {
                    #[cfg(feature = "stats")]
                    self.counters.record_scan(count);
                    return Ok(count);
                }
                t = node.output;
            }

            i += 1;
        }

        #[cfg(feature = "stats")]
        self.counters.record_scan(count);
        Ok(count)
    }

    /// Next position at or after `i` whose byte has a root child, or `None`
    /// when no such byte remains (the scan is finished). Positions in
    /// between keep the automaton in the root state and cannot emit.
    #[inline]
    fn skip_from_root(&self, text: &[u8], i: usize) -> Option<usize> {
        let tail = &text[i..];
        let rel = match self.root_bytes.as_slice() {
            [] => return None,
            &[a] => memchr::memchr(a, tail),
            &[a, b] => memchr::memchr2(a, b, tail),
            &[a, b, c] => memchr::memchr3(a, b, c, tail),
            // Dense root: skipping would cost more than it saves.
            _ => return Some(i),
        };
        rel.map(|r| i + r)
    }
}
