//! Identity matching for sequences of entities.
//!
//! Plain sequences (contexts, servers, certs) match elements on an identity
//! field. Sequences of one-of variants (discovery sources) match on the
//! identity field *inside* whichever variant is populated, so an element can
//! change shape without losing its place in the list.

use super::{PatchError, PatchStrategies, PatchStrategy, apply_patch, join_path};
use crate::node::Node;

/// Describes a sequence of one-of variant elements.
#[derive(Debug, Clone, Copy)]
pub struct VariantSpec {
    /// Accepted variant keys, in precedence order.
    pub variants: &'static [&'static str],
    /// Identity field inside the variant payload.
    pub identity: &'static str,
    /// Element-level fields that belong to the variant shape and are replaced
    /// together with it.
    pub siblings: &'static [&'static str],
}

/// Plugin discovery sources: `{oci: {name, image}}`, `{local: {name, path}}`, ...
pub const DISCOVERY_SOURCE: VariantSpec = VariantSpec {
    variants: &["oci", "local", "gcp", "kubernetes", "rest"],
    identity: "name",
    siblings: &["contextType"],
};

impl VariantSpec {
    /// First populated variant key of `element`.
    pub fn variant_of(&self, element: &Node) -> Option<&'static str> {
        self.variants
            .iter()
            .copied()
            .find(|v| element.get(v).is_some_and(Node::is_mapping))
    }

    /// Identity value of `element`, read from inside its variant payload.
    pub fn identity_of<'n>(&self, element: &'n Node) -> Option<&'n str> {
        let variant = self.variant_of(element)?;
        element.get(variant)?.get_str(self.identity)
    }

    /// Index of the element whose identity is `name`, whatever its variant.
    pub fn position(&self, seq: &Node, name: &str) -> Option<usize> {
        seq.children
            .iter()
            .position(|e| self.identity_of(e) == Some(name))
    }

    /// Element whose identity is `name`.
    pub fn find<'n>(&self, seq: &'n Node, name: &str) -> Option<&'n Node> {
        self.position(seq, name).map(|i| &seq.children[i])
    }

    /// Insert or update `new` in `seq`.
    ///
    /// Same identity and same variant: ordinary patch. Same identity and a
    /// different variant: the old variant block and its sibling fields are
    /// swapped out in place, then the rest of `new` is applied with those
    /// paths forced to replace. No match: append.
    pub fn upsert(
        &self,
        seq: &mut Node,
        new: &Node,
        strategies: &PatchStrategies,
        prefix: &str,
    ) -> Result<bool, PatchError> {
        if !seq.is_sequence() {
            return Err(PatchError::NotASequence {
                path: prefix.to_string(),
            });
        }
        let new_variant = self
            .variant_of(new)
            .ok_or_else(|| PatchError::UnknownVariant {
                path: prefix.to_string(),
                expected: self.variants.join(", "),
            })?;
        let name = self
            .identity_of(new)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PatchError::MissingIdentity {
                path: join_path(prefix, new_variant),
                field: self.identity.to_string(),
            })?;

        let Some(idx) = self.position(seq, name) else {
            seq.children.push(new.clone());
            return Ok(true);
        };

        let existing = &mut seq.children[idx];
        let Some(old_variant) = self.variant_of(existing) else {
            return Err(PatchError::UnknownVariant {
                path: prefix.to_string(),
                expected: self.variants.join(", "),
            });
        };
        if old_variant == new_variant {
            return apply_patch(new, existing, strategies, prefix);
        }

        tracing::debug!(
            "replacing {prefix} '{name}': variant {old_variant} -> {new_variant}"
        );
        let mut forced = strategies
            .with(join_path(prefix, old_variant), PatchStrategy::Replace)
            .with(join_path(prefix, new_variant), PatchStrategy::Replace);
        for sibling in self.siblings {
            forced.set(join_path(prefix, sibling), PatchStrategy::Replace);
            if !new.contains_key(sibling) {
                existing.remove(sibling);
            }
        }

        if let (Some(key_idx), Some(payload)) = (existing.key_index(old_variant), new.get(new_variant))
        {
            existing.children[key_idx] = Node::string(new_variant);
            existing.children[key_idx + 1] = payload.clone();
        }
        apply_patch(new, existing, &forced, prefix)?;
        Ok(true)
    }

    /// Remove every element whose identity is `name`. Returns whether any was removed.
    pub fn remove(&self, seq: &mut Node, name: &str) -> bool {
        let before = seq.children.len();
        seq.children.retain(|e| self.identity_of(e) != Some(name));
        seq.children.len() != before
    }
}

/// Index of the mapping element of `seq` whose `field` equals `value`.
pub fn position_by_identity(seq: &Node, field: &str, value: &str) -> Option<usize> {
    if !seq.is_sequence() {
        return None;
    }
    seq.children
        .iter()
        .position(|e| e.get_str(field) == Some(value))
}

/// Element of `seq` whose `field` equals `value`.
pub fn find_by_identity<'n>(seq: &'n Node, field: &str, value: &str) -> Option<&'n Node> {
    position_by_identity(seq, field, value).map(|i| &seq.children[i])
}

/// Patch the element matching `new`'s `field`, or append `new`.
pub fn upsert_by_identity(
    seq: &mut Node,
    new: &Node,
    field: &str,
    strategies: &PatchStrategies,
    prefix: &str,
) -> Result<bool, PatchError> {
    if !seq.is_sequence() {
        return Err(PatchError::NotASequence {
            path: prefix.to_string(),
        });
    }
    let value = new
        .get_str(field)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PatchError::MissingIdentity {
            path: prefix.to_string(),
            field: field.to_string(),
        })?;

    match position_by_identity(seq, field, value) {
        Some(idx) => apply_patch(new, &mut seq.children[idx], strategies, prefix),
        None => {
            seq.children.push(new.clone());
            Ok(true)
        }
    }
}

/// Remove every element whose `field` equals `value`. Returns whether any was removed.
pub fn remove_by_identity(seq: &mut Node, field: &str, value: &str) -> bool {
    if !seq.is_sequence() {
        return false;
    }
    let before = seq.children.len();
    seq.children.retain(|e| e.get_str(field) != Some(value));
    seq.children.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::yaml::{emit_document, parse_document};
    use pretty_assertions::assert_eq;

    fn seq(text: &str) -> Node {
        parse_document(text).unwrap().content().unwrap().clone()
    }

    fn element(text: &str) -> Node {
        seq(text)
    }

    fn emit(node: &Node) -> String {
        emit_document(node).unwrap()
    }

    #[test]
    fn test_variant_and_identity() {
        let e = element("contextType: k8s\nlocal:\n  name: default\n  path: /p\n");
        assert_eq!(DISCOVERY_SOURCE.variant_of(&e), Some("local"));
        assert_eq!(DISCOVERY_SOURCE.identity_of(&e), Some("default"));
        assert_eq!(DISCOVERY_SOURCE.variant_of(&element("s3:\n  name: x\n")), None);
    }

    #[test]
    fn test_same_variant_merges() {
        let mut s = seq("- oci:\n    name: default\n    image: old\n    extra: keep\n");
        let new = element("oci:\n  name: default\n  image: new\n");
        let changed = DISCOVERY_SOURCE
            .upsert(&mut s, &new, &PatchStrategies::default(), "cli.discoverySources")
            .unwrap();
        assert!(changed);
        assert_eq!(
            emit(&s),
            "- oci:\n    name: default\n    image: new\n    extra: keep\n"
        );
    }

    #[test]
    fn test_same_variant_unchanged() {
        let mut s = seq("- oci:\n    name: default\n    image: img\n");
        let new = element("oci:\n  name: default\n  image: img\n");
        assert!(
            !DISCOVERY_SOURCE
                .upsert(&mut s, &new, &PatchStrategies::default(), "cli.discoverySources")
                .unwrap()
        );
    }

    #[test]
    fn test_variant_swap_leaves_no_stale_fields() {
        let mut s = seq(concat!(
            "- oci:\n    name: other\n    image: o\n",
            "- contextType: k8s\n  oci:\n    name: x\n    image: old\n",
        ));
        let new = element("local:\n  name: x\n  path: /plugins\n");
        let changed = DISCOVERY_SOURCE
            .upsert(&mut s, &new, &PatchStrategies::default(), "cli.discoverySources")
            .unwrap();
        assert!(changed);
        assert_eq!(
            emit(&s),
            "- oci:\n    name: other\n    image: o\n- local:\n    name: x\n    path: /plugins\n"
        );
        assert_eq!(
            s.children
                .iter()
                .filter(|e| DISCOVERY_SOURCE.identity_of(e) == Some("x"))
                .count(),
            1
        );
    }

    #[test]
    fn test_unknown_name_appends() {
        let mut s = seq("- oci:\n    name: a\n    image: i\n");
        let new = element("rest:\n  name: b\n  endpoint: http://e\n");
        assert!(
            DISCOVERY_SOURCE
                .upsert(&mut s, &new, &PatchStrategies::default(), "p")
                .unwrap()
        );
        assert_eq!(s.children.len(), 2);
    }

    #[test]
    fn test_new_without_variant_is_error() {
        let mut s = Node::sequence();
        let err = DISCOVERY_SOURCE
            .upsert(&mut s, &element("name: a\n"), &PatchStrategies::default(), "p")
            .unwrap_err();
        assert!(matches!(err, PatchError::UnknownVariant { .. }));
    }

    #[test]
    fn test_remove_variant_by_name() {
        let mut s = seq("- oci:\n    name: a\n- gcp:\n    name: b\n");
        assert!(DISCOVERY_SOURCE.remove(&mut s, "b"));
        assert!(!DISCOVERY_SOURCE.remove(&mut s, "b"));
        assert_eq!(s.children.len(), 1);
    }

    #[test]
    fn test_upsert_by_identity() {
        let mut s = seq("- host: h1\n  insecure: 'false'\n");
        let new = element("host: h1\ninsecure: 'true'\n");
        assert!(upsert_by_identity(&mut s, &new, "host", &PatchStrategies::default(), "certs").unwrap());
        assert_eq!(emit(&s), "- host: h1\n  insecure: 'true'\n");

        let other = element("host: h2\n");
        assert!(upsert_by_identity(&mut s, &other, "host", &PatchStrategies::default(), "certs").unwrap());
        assert_eq!(s.children.len(), 2);
        assert!(remove_by_identity(&mut s, "host", "h1"));
        assert_eq!(find_by_identity(&s, "host", "h2"), Some(&other));
    }

    #[test]
    fn test_upsert_by_identity_requires_identity() {
        let mut s = Node::sequence();
        let err = upsert_by_identity(&mut s, &element("insecure: 'true'\n"), "host", &PatchStrategies::default(), "certs")
            .unwrap_err();
        assert_eq!(
            err,
            PatchError::MissingIdentity {
                path: "certs".into(),
                field: "host".into()
            }
        );
    }
}
