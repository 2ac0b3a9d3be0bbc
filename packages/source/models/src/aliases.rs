//! Explicit jurisdiction name rewrites.
//!
//! The target, permit and boundary datasets share no join key, only names,
//! and they do not always spell them the same way. Rather than fuzzy
//! matching, every known spelling difference is listed once in
//! configuration and applied to all sources before any join.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Map from a source spelling to the canonical jurisdiction name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameAliases(BTreeMap<String, String>);

impl NameAliases {
    /// Creates an alias map from `(source spelling, canonical)` pairs.
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    /// Returns the canonical spelling of `name` (trimmed), or the trimmed
    /// name itself when no alias is configured.
    #[must_use]
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        let trimmed = name.trim();
        self.0.get(trimmed).map_or(trimmed, String::as_str)
    }

    /// Number of configured aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no aliases are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
