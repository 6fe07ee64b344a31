//! Per-path patch strategies.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How an update is applied to an existing subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchStrategy {
    /// Deep-merge: fields only present in the existing value survive.
    #[default]
    Merge,
    /// The new value fully overwrites the existing one.
    Replace,
}

impl FromStr for PatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "replace" => Ok(Self::Replace),
            other => Err(format!(
                "invalid patch strategy: {other}. Must be 'merge' or 'replace'"
            )),
        }
    }
}

impl fmt::Display for PatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

/// Additional metadata on contexts is an open map owned by its writer.
pub const DEFAULT_REPLACE_PATHS: &[&str] = &["contexts.additionalMetadata"];

/// Map of dotted path -> strategy.
///
/// Paths name mapping keys only; sequence elements share their parent's
/// prefix (`contexts.name` applies to every context). The most specific
/// matching entry wins, so `a.b: replace` governs `a.b.c` unless `a.b.c`
/// has its own entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchStrategies {
    entries: BTreeMap<String, PatchStrategy>,
}

impl Default for PatchStrategies {
    fn default() -> Self {
        let entries = DEFAULT_REPLACE_PATHS
            .iter()
            .map(|p| ((*p).to_string(), PatchStrategy::Replace))
            .collect();
        Self { entries }
    }
}

impl PatchStrategies {
    /// A map with no entries at all; everything merges.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Defaults overlaid with `overrides`. Unparseable values are skipped.
    pub fn with_overrides<'a>(overrides: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut strategies = Self::default();
        for (path, raw) in overrides {
            match raw.parse() {
                Ok(strategy) => {
                    strategies.set(path, strategy);
                }
                Err(e) => tracing::warn!("ignoring patch strategy for '{path}': {e}"),
            }
        }
        strategies
    }

    pub fn set(&mut self, path: impl Into<String>, strategy: PatchStrategy) -> &mut Self {
        self.entries.insert(path.into(), strategy);
        self
    }

    /// Copy of `self` with one extra entry, for a single patch call.
    #[must_use]
    pub fn with(&self, path: impl Into<String>, strategy: PatchStrategy) -> Self {
        let mut copy = self.clone();
        copy.set(path, strategy);
        copy
    }

    /// Longest-prefix lookup on dotted segments; `Merge` when nothing matches.
    pub fn resolve(&self, path: &str) -> PatchStrategy {
        let mut candidate = path;
        loop {
            if let Some(strategy) = self.entries.get(candidate) {
                return *strategy;
            }
            match candidate.rfind('.') {
                Some(dot) => candidate = &candidate[..dot],
                None => return PatchStrategy::Merge,
            }
        }
    }

    /// Whether some path strictly below `path` carries an explicit entry
    /// different from `strategy`.
    pub fn has_descendant_override(&self, path: &str, strategy: PatchStrategy) -> bool {
        let prefix = format!("{path}.");
        self.entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .any(|(_, s)| *s != strategy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PatchStrategy)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Join a strategy prefix and a key.
pub fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
