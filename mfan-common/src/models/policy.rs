//! Content policy snapshot and decision types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered set of lowercase blocked terms
///
/// Terms are lower-cased and trimmed on construction; empty terms are
/// discarded (an empty substring would match every title) and duplicates
/// keep their first position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct BlockedTerms(Vec<String>);

impl BlockedTerms {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if term.is_empty() || out.contains(&term) {
                continue;
            }
            out.push(term);
        }
        Self(out)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// First blocked term contained in `haystack` (already lower-cased).
    pub fn first_match(&self, haystack_lower: &str) -> Option<&str> {
        self.iter().find(|term| haystack_lower.contains(term))
    }
}

impl From<Vec<String>> for BlockedTerms {
    fn from(terms: Vec<String>) -> Self {
        BlockedTerms::new(terms)
    }
}

impl From<BlockedTerms> for Vec<String> {
    fn from(terms: BlockedTerms) -> Self {
        terms.0
    }
}

/// Read-only configuration snapshot taken once per aggregation session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    /// Global switch: when true, no filtering happens for anyone
    #[serde(default)]
    pub global_filter_disabled: bool,
    /// Group name → filtering enabled for members of that group
    #[serde(default)]
    pub group_policies: BTreeMap<String, bool>,
    #[serde(default)]
    pub blocked_terms: BlockedTerms,
}

impl PolicySnapshot {
    /// First of `groups` whose policy enables filtering, if any.
    pub fn any_group_filters<'a, I>(&self, groups: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a String>,
    {
        groups
            .into_iter()
            .find(|g| self.group_policies.get(g.as_str()).copied().unwrap_or(false))
            .map(String::as_str)
    }
}

/// Whether content filtering applies for the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub applies: bool,
    pub reason: String,
}

impl PolicyDecision {
    pub fn applies(reason: impl Into<String>) -> Self {
        Self {
            applies: true,
            reason: reason.into(),
        }
    }

    pub fn exempt(reason: impl Into<String>) -> Self {
        Self {
            applies: false,
            reason: reason.into(),
        }
    }
}
