//! Rule store: the configured (pattern, replacement) set behind an engine.
//!
//! Owns the bytes the automaton borrows. Rules keep insertion order so a
//! given configuration always registers in the same sequence and compiles
//! to an identical arena; re-inserting a pattern overwrites its replacement
//! in place (last writer wins). [`RuleSet::overlay`] reproduces the
//! hierarchical config merge of the host module this store came from: the
//! overriding set's rules win over the base set's.

use ahash::AHashMap;

use crate::api::Error;
use crate::engine::Automaton;
use crate::template::TemplateBinding;

/// One configured rule.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    pattern: Box<[u8]>,
    binding: TemplateBinding,
}

/// Insertion-ordered, last-writer-wins rule map.
#[derive(Clone, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Vec<RawRule>", into = "Vec<RawRule>")
)]
pub struct RuleSet {
    entries: Vec<Entry>,
    /// Pattern -> slot in `entries`. The key duplicates the pattern bytes;
    /// rule sets are small and the map makes rewrites O(1).
    index: AHashMap<Box<[u8]>, usize>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite the rule for `pattern`.
    ///
    /// The replacement value is classified on insert: a whole-value
    /// `${NAME}` / `%{NAME}` becomes a dynamic template, anything else a
    /// literal. Overwriting keeps the pattern's original position.
    pub fn insert(&mut self, pattern: impl Into<Vec<u8>>, replacement: impl Into<Vec<u8>>) {
        let pattern: Box<[u8]> = pattern.into().into_boxed_slice();
        let binding = TemplateBinding::parse(replacement.into());
        match self.index.get(&pattern).copied() {
            Some(slot) => self.entries[slot].binding = binding,
            None => {
                self.index.insert(pattern.clone(), self.entries.len());
                self.entries.push(Entry { pattern, binding });
            }
        }
    }

    /// The replacement binding for `pattern`, if present.
    pub fn get(&self, pattern: &[u8]) -> Option<&TemplateBinding> {
        self.index.get(pattern).map(|&slot| &self.entries[slot].binding)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &TemplateBinding)> {
        self.entries.iter().map(|e| (&*e.pattern, &e.binding))
    }

    /// Merge with a base set; rules in `self` win over rules in `base`.
    ///
    /// Base rules keep their relative order, followed by the rules unique
    /// to `self`, mirroring a parent/child configuration merge.
    pub fn overlay(&self, base: &RuleSet) -> RuleSet {
        let mut merged = RuleSet::new();
        for (pattern, binding) in base.iter() {
            merged.insert(pattern.to_vec(), binding.raw().to_vec());
        }
        for (pattern, binding) in self.iter() {
            merged.insert(pattern.to_vec(), binding.raw().to_vec());
        }
        merged
    }

    /// Build and compile an automaton over this rule set.
    ///
    /// Literal rules register their replacement bytes directly; template
    /// rules register their binding as user data and resolve at match time
    /// through [`crate::template::resolver`]. The automaton borrows this
    /// set's bytes, so the set must outlive it. `capacity` is the node
    /// arena size (0 selects the default).
    ///
    /// # Errors
    /// - [`Error::ArenaFull`] when the rule set does not fit in `capacity`.
    /// - [`Error::EmptyPattern`] if an empty pattern was stored.
    pub fn compile_automaton(
        &self,
        capacity: usize,
    ) -> Result<Automaton<'_, TemplateBinding>, Error> {
        let mut ac: Automaton<'_, TemplateBinding> = Automaton::new(capacity);
        for entry in &self.entries {
            if entry.binding.is_dynamic() {
                ac.register_with_data(&entry.pattern, None, Some(entry.binding.clone()))?;
            } else {
                ac.register(&entry.pattern, entry.binding.raw())?;
            }
        }
        ac.compile()?;
        Ok(ac)
    }
}

/// Serialization shape: a plain ordered list of rules.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawRule {
    pattern: Vec<u8>,
    replacement: Vec<u8>,
}

#[cfg(feature = "serde")]
impl From<Vec<RawRule>> for RuleSet {
    fn from(rules: Vec<RawRule>) -> Self {
        let mut set = RuleSet::new();
        for rule in rules {
            set.insert(rule.pattern, rule.replacement);
        }
        set
    }
}

#[cfg(feature = "serde")]
impl From<RuleSet> for Vec<RawRule> {
    fn from(set: RuleSet) -> Self {
        set.entries
            .into_iter()
            .map(|e| RawRule {
                pattern: e.pattern.into_vec(),
                replacement: e.binding.raw().to_vec(),
            })
            .collect()
    }
}
