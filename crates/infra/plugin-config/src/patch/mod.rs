//! Strategy-driven patching of node trees.
//!
//! [`apply_patch`] brings an existing subtree up to date with a new one in two
//! passes:
//!
//! 1. **Replace pass**: every key of the new subtree whose path resolves to
//!    [`PatchStrategy::Replace`] is overwritten wholesale (in place, so key
//!    order is kept). A replace path with a more specific `merge` entry below
//!    it is pruned key by key instead.
//! 2. **Merge pass**: remaining keys are merged recursively. Mappings recurse,
//!    scalars and sequences are overwritten only when they differ, missing
//!    keys are appended, and keys only present in the existing subtree are
//!    never removed.
//!
//! Both passes report whether they touched anything, so an unchanged update
//! can skip the write entirely. Scalars compare by text: a core-schema tag
//! difference alone is not a change.

mod strategy;
pub mod variant;

pub use strategy::{DEFAULT_REPLACE_PATHS, PatchStrategies, PatchStrategy, join_path};
pub use variant::{
    DISCOVERY_SOURCE, VariantSpec, find_by_identity, position_by_identity, remove_by_identity,
    upsert_by_identity,
};

use thiserror::Error;

use crate::node::Node;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("malformed mapping at '{path}': keys must be unique scalars")]
    MalformedMapping { path: String },

    #[error("element at '{path}' has no recognised variant (expected one of: {expected})")]
    UnknownVariant { path: String, expected: String },

    #[error("element at '{path}' is missing identity field '{field}'")]
    MissingIdentity { path: String, field: String },

    #[error("expected a sequence at '{path}'")]
    NotASequence { path: String },
}

/// Apply `new` onto `existing` using `strategies`, with paths rooted at `prefix`.
///
/// Returns `true` iff at least one value was added, removed by a replace
/// strategy, or altered. An empty `new` is a no-op.
pub fn apply_patch(
    new: &Node,
    existing: &mut Node,
    strategies: &PatchStrategies,
    prefix: &str,
) -> Result<bool, PatchError> {
    let Some(new) = new.content() else {
        return Ok(false);
    };
    if new.is_empty() {
        return Ok(false);
    }
    let Some(existing) = existing.content_mut() else {
        return Ok(false);
    };

    if !new.is_mapping() || !existing.is_mapping() {
        if existing.same_content(new) {
            return Ok(false);
        }
        *existing = new.clone();
        return Ok(true);
    }

    check_mappings(new, prefix)?;
    check_mappings(existing, prefix)?;

    let replaced = replace_pass(new, existing, strategies, prefix);
    let merged = merge_pass(new, existing);
    Ok(replaced || merged)
}

fn replace_pass(
    new: &Node,
    existing: &mut Node,
    strategies: &PatchStrategies,
    prefix: &str,
) -> bool {
    let mut changed = false;
    for (k, new_value) in new.pairs() {
        let path = join_path(prefix, &k.value);
        let Some(current) = existing.get_mut(&k.value) else {
            continue;
        };

        match strategies.resolve(&path) {
            PatchStrategy::Replace
                if new_value.is_mapping()
                    && current.is_mapping()
                    && strategies.has_descendant_override(&path, PatchStrategy::Replace) =>
            {
                changed |= prune_replaced(new_value, current, strategies, &path);
                changed |= replace_pass(new_value, current, strategies, &path);
            }
            PatchStrategy::Replace => {
                if !current.same_content(new_value) {
                    *current = new_value.clone();
                    changed = true;
                }
            }
            PatchStrategy::Merge => {
                if new_value.is_mapping() && current.is_mapping() {
                    changed |= replace_pass(new_value, current, strategies, &path);
                }
            }
        }
    }
    changed
}

/// Drop keys of `existing` that resolve to replace but are absent from `new`.
fn prune_replaced(
    new: &Node,
    existing: &mut Node,
    strategies: &PatchStrategies,
    path: &str,
) -> bool {
    let stale: Vec<String> = existing
        .keys()
        .filter(|k| {
            !new.contains_key(k)
                && strategies.resolve(&join_path(path, k)) == PatchStrategy::Replace
        })
        .map(str::to_string)
        .collect();
    for key in &stale {
        existing.remove(key);
    }
    !stale.is_empty()
}

fn merge_pass(new: &Node, existing: &mut Node) -> bool {
    let mut changed = false;
    for (k, new_value) in new.pairs() {
        match existing.get_mut(&k.value) {
            Some(current) if new_value.is_mapping() && current.is_mapping() => {
                changed |= merge_pass(new_value, current);
            }
            Some(current) => {
                if !current.same_content(new_value) {
                    *current = new_value.clone();
                    changed = true;
                }
            }
            None => {
                existing.children.push(k.clone());
                existing.children.push(new_value.clone());
                changed = true;
            }
        }
    }
    changed
}

fn check_mappings(node: &Node, path: &str) -> Result<(), PatchError> {
    if !node.is_mapping() {
        return Ok(());
    }
    if !node.is_well_formed_mapping() {
        return Err(PatchError::MalformedMapping {
            path: path.to_string(),
        });
    }
    for (k, v) in node.pairs() {
        check_mappings(v, &join_path(path, &k.value))?;
    }
    Ok(())
}
