//! Inclusion filter: decides whether a fully-qualified declaration name is
//! in scope for extraction.
//!
//! Allow patterns come from configuration; a trailing `*` (or one anywhere)
//! matches any suffix segment chain. Patterns are compiled once into
//! anchored regexes, so matching is full-string, never substring. A small
//! set of hard exclusions always wins over the allow list.

use regex::Regex;

use crate::config::ConfigError;

/// Names containing any of these are never extracted, regardless of the
/// allow list: internal compound-operation plumbing and the privacy-sensitive
/// replica context type.
const HARD_EXCLUSIONS: [&str; 2] = ["is_compound_operation", "replica_context"];

/// Marker carried by the aliases that trigger legacy-durability derivation.
pub const LEGACY_DURABILITY_MARKER: &str = "_with_legacy_durability";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Alias evaluation only: the name must also contain
    /// [`LEGACY_DURABILITY_MARKER`].
    MarkerSuffix,
}

#[derive(Debug)]
pub struct InclusionFilter {
    patterns: Vec<Regex>,
}

impl InclusionFilter {
    pub fn new(allow_patterns: &[String]) -> Result<Self, ConfigError> {
        let mut patterns = Vec::with_capacity(allow_patterns.len());
        for raw in allow_patterns {
            let body = raw
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join("(.*)");
            let compiled = Regex::new(&format!("^{body}$")).map_err(|source| {
                ConfigError::AllowPattern {
                    pattern: raw.clone(),
                    source,
                }
            })?;
            patterns.push(compiled);
        }
        Ok(Self { patterns })
    }

    /// Pure predicate; no side effects.
    pub fn is_included(&self, qualified_name: &str, mode: Mode) -> bool {
        if HARD_EXCLUSIONS.iter().any(|x| qualified_name.contains(x)) {
            return false;
        }
        if mode == Mode::MarkerSuffix && !qualified_name.contains(LEGACY_DURABILITY_MARKER) {
            return false;
        }
        self.patterns.iter().any(|re| re.is_match(qualified_name))
    }
}

// ------------------------------- Tests ------------------------------------ //
