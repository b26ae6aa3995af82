//! Replacement-template layer: variable-shaped replacement values resolved
//! per invocation.
//!
//! A replacement value that is exactly `${NAME}` or `%{NAME}` is a template:
//! the bytes substituted at match time come from a [`VarSource`] looked up
//! under `NAME` at each invocation, so one compiled automaton serves many
//! invocations with different variable tables. Anything else is a literal.
//!
//! The engine itself never interprets templates. [`TemplateBinding`] rides
//! along as per-pattern user data, and [`resolver`] adapts a variable source
//! into the callback shape [`Automaton::replace_with`] expects.
//!
//! [`Automaton::replace_with`]: crate::Automaton::replace_with

use ahash::AHashMap;

use crate::api::Match;

/// Source of variable values for template expansion.
///
/// Lookups return owned bytes because a source may synthesize values (for
/// example, reading the process environment).
pub trait VarSource {
    /// The value bound to `name`, or `None` if unbound here.
    fn var(&self, name: &str) -> Option<Vec<u8>>;
}

/// Variable source backed by the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvVars;

impl VarSource for EnvVars {
    fn var(&self, name: &str) -> Option<Vec<u8>> {
        std::env::var(name).ok().map(String::into_bytes)
    }
}

/// In-memory variable table, typically rebuilt per invocation (request
/// attributes, nonces). Optionally falls back to the process environment
/// for names it does not hold.
#[derive(Clone, Debug, Default)]
pub struct MapVars {
    vars: AHashMap<String, Vec<u8>>,
    env_fallback: bool,
}

impl MapVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unresolved names fall through to the process environment.
    pub fn with_env_fallback() -> Self {
        MapVars {
            vars: AHashMap::new(),
            env_fallback: true,
        }
    }

    /// Bind `name`, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl VarSource for MapVars {
    fn var(&self, name: &str) -> Option<Vec<u8>> {
        match self.vars.get(name) {
            Some(v) => Some(v.clone()),
            None if self.env_fallback => EnvVars.var(name),
            None => None,
        }
    }
}

/// A parsed replacement value: either a literal or a whole-value variable
/// reference.
///
/// Parsing is shape-only and infallible; a malformed reference is just a
/// literal. Expansion of an unbound variable falls back to the raw template
/// bytes, so missing variables are visible in the output rather than
/// silently dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemplateBinding {
    raw: Vec<u8>,
    var: Option<String>,
}

impl TemplateBinding {
    /// Classify `raw`. `${NAME}` and `%{NAME}` (whole value, non-empty
    /// UTF-8 name) parse as variable references; everything else is a
    /// literal.
    pub fn parse(raw: impl Into<Vec<u8>>) -> Self {
        let raw = raw.into();
        let var = parse_var_name(&raw).map(str::to_owned);
        TemplateBinding { raw, var }
    }

    /// The verbatim replacement value as configured.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The referenced variable name, if this value is a template.
    pub fn var_name(&self) -> Option<&str> {
        self.var.as_deref()
    }

    /// Whether expansion depends on the invocation's variable source.
    pub fn is_dynamic(&self) -> bool {
        self.var.is_some()
    }

    /// Produce the replacement bytes for one invocation.
    pub fn expand(&self, vars: &dyn VarSource) -> Vec<u8> {
        match &self.var {
            Some(name) => vars.var(name).unwrap_or_else(|| self.raw.clone()),
            None => self.raw.clone(),
        }
    }
}

fn parse_var_name(raw: &[u8]) -> Option<&str> {
    // Minimum shape: ${X}
    if raw.len() < 4 {
        return None;
    }
    if !(raw[0] == b'$' || raw[0] == b'%') || raw[1] != b'{' || raw[raw.len() - 1] != b'}' {
        return None;
    }
    let name = &raw[2..raw.len() - 1];
    match std::str::from_utf8(name) {
        Ok(s) if !s.is_empty() && !s.contains('}') => Some(s),
        _ => None,
    }
}

/// Adapt a variable source into a replacement callback for
/// [`Automaton::replace_with`].
///
/// Patterns registered with a [`TemplateBinding`] expand against `vars`;
/// patterns registered with only a static replacement use it verbatim;
/// patterns with neither are deleted.
///
/// [`Automaton::replace_with`]: crate::Automaton::replace_with
pub fn resolver<V: VarSource>(
    vars: &V,
) -> impl FnMut(&Match<'_, TemplateBinding>) -> Vec<u8> + '_ {
    move |m| match m.user_data {
        Some(binding) => binding.expand(vars),
        None => m.replacement.map(<[u8]>::to_vec).unwrap_or_default(),
    }
}
