//! Multi-pattern text substitution over a precompiled Aho-Corasick
//! automaton.
//!
//! Compile a set of (pattern, replacement) rules once, then rewrite any
//! number of byte buffers against them:
//! - One linear pass locates every occurrence of every pattern
//!   (goto/failure/output links; O(text + matches)).
//! - A planner reduces overlapping occurrences to a non-overlapping,
//!   leftmost-wins schedule.
//! - Replacements are static bytes, or resolved at match time by a callback
//!   so one compiled automaton serves many invocations with different
//!   contexts (request variables, nonces).
//! - Output is materialized into a fresh buffer or spliced in place under a
//!   fixed capacity.
//!
//! Patterns are literal byte sequences over the full 0-255 alphabet; there
//! is no regex or case-folding semantics. The compiled automaton is
//! read-only and shareable across threads; all per-invocation state lives
//! with the invocation.
//!
//! ```
//! use rewriter_rs::Automaton;
//!
//! let mut ac: Automaton = Automaton::new(0);
//! ac.register(b"hello", b"hi").unwrap();
//! ac.register(b"world", b"universe").unwrap();
//! ac.compile().unwrap();
//!
//! let out = ac.replace_alloc(b"hello world").unwrap();
//! assert_eq!(out.bytes, b"hi universe");
//! assert_eq!(out.replaced, 2);
//! ```
//!
//! The [`rules`] and [`template`] modules carry the host-side layer the
//! engine is usually embedded under: an ordered rule store that owns the
//! pattern bytes, and `${NAME}` / `%{NAME}` replacement templates expanded
//! per invocation through [`Automaton::replace_with`].

pub mod api;
mod engine;
pub mod rules;
pub mod template;

#[cfg(feature = "stats")]
pub use api::CountersSnapshot;
pub use api::{Error, InplaceOutcome, Match, NodeId, Rewritten, Stats};
pub use engine::{Automaton, DEFAULT_NODE_CAPACITY};
pub use rules::RuleSet;
pub use template::{resolver, EnvVars, MapVars, TemplateBinding, VarSource};
