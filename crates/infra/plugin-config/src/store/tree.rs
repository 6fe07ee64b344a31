//! The two physical documents behind one logical client config.
//!
//! `contexts` and `currentContext` are routed to the next-gen document,
//! every other top-level key to the main document. Documents written before
//! the split still carry routed keys in the main file; those are adopted into
//! the next-gen view on load and move there on the next persist.

use crate::error::Result;
use crate::locks::LockGuard;
use crate::node::{self, Key, Node};
use crate::paths::ConfigPaths;
use crate::writer::{read_document, write_document_atomic};

/// Top-level keys stored in the next-gen document.
pub const NEXT_GEN_KEYS: &[&str] = &["contexts", "currentContext"];

pub fn is_next_gen_key(key: &str) -> bool {
    NEXT_GEN_KEYS.contains(&key)
}

#[derive(Debug, Clone)]
pub struct ConfigTree {
    main: Node,
    next_gen: Node,
    loaded_main: Node,
    loaded_next_gen: Node,
}

impl ConfigTree {
    pub fn load(paths: &ConfigPaths) -> Result<Self> {
        let main = read_document(&paths.main)?;
        if paths.next_gen == paths.main {
            return Ok(Self::from_documents(main, Node::empty_document()));
        }
        let next_gen = read_document(&paths.next_gen)?;
        Ok(Self::from_documents(main, next_gen))
    }

    /// Build from already-parsed documents, adopting legacy routed keys.
    pub fn from_documents(main: Node, next_gen: Node) -> Self {
        let loaded_main = main.clone();
        let loaded_next_gen = next_gen.clone();
        let mut tree = Self {
            main,
            next_gen,
            loaded_main,
            loaded_next_gen,
        };
        tree.adopt_legacy_keys();
        tree
    }

    fn adopt_legacy_keys(&mut self) {
        let (Some(main), Some(next_gen)) = (self.main.content_mut(), self.next_gen.content_mut())
        else {
            return;
        };
        for key in NEXT_GEN_KEYS {
            let ng_has_value = next_gen.get(key).is_some_and(|v| !v.is_empty());
            if ng_has_value || !main.contains_key(key) {
                continue;
            }
            if let Some(value) = main.remove(key) {
                tracing::warn!("moving '{key}' from the main config into the next-gen config");
                next_gen.insert(key, value);
            }
        }
    }

    fn document_for(&self, key: &str) -> &Node {
        if is_next_gen_key(key) {
            &self.next_gen
        } else {
            &self.main
        }
    }

    fn document_for_mut(&mut self, key: &str) -> &mut Node {
        if is_next_gen_key(key) {
            &mut self.next_gen
        } else {
            &mut self.main
        }
    }

    /// Read-only lookup, routed by the first path segment.
    pub fn find(&self, path: &[Key]) -> Option<&Node> {
        let first = path.first()?;
        node::find(self.document_for(&first.name), path)
    }

    /// Mutable lookup, routed by the first path segment.
    pub fn find_mut(&mut self, path: &[Key], force_create: bool) -> Option<&mut Node> {
        let first = path.first()?;
        node::find_mut(self.document_for_mut(&first.name), path, force_create)
    }

    /// Root mapping of the main document and of the next-gen document.
    pub fn roots_mut(&mut self) -> (Option<&mut Node>, Option<&mut Node>) {
        (self.main.content_mut(), self.next_gen.content_mut())
    }

    pub fn main_root(&self) -> Option<&Node> {
        self.main.content()
    }

    pub fn main_root_mut(&mut self) -> Option<&mut Node> {
        self.main.content_mut()
    }

    /// Single mapping with the main document's keys followed by the routed keys.
    pub fn merged(&self) -> Node {
        let mut merged = self.main.content().cloned().unwrap_or_else(Node::mapping);
        if let Some(next_gen) = self.next_gen.content() {
            for (k, v) in next_gen.pairs() {
                if is_next_gen_key(&k.value) {
                    merged.insert(&k.value, v.clone());
                }
            }
        }
        merged
    }

    pub fn is_dirty(&self) -> bool {
        self.main != self.loaded_main || self.next_gen != self.loaded_next_gen
    }

    /// Write whichever documents changed since load: next-gen first, then main.
    pub fn persist(&mut self, paths: &ConfigPaths, guard: &LockGuard<'_>) -> Result<()> {
        tracing::debug!("persisting under {}", guard.primary_path().display());
        let same_file = paths.next_gen == paths.main;

        if same_file {
            if self.is_dirty() {
                let merged = Node::document(self.merged());
                write_document_atomic(&paths.main, &merged)?;
            }
        } else {
            if self.next_gen != self.loaded_next_gen {
                write_document_atomic(&paths.next_gen, &self.next_gen)?;
            }
            if self.main != self.loaded_main {
                write_document_atomic(&paths.main, &self.main)?;
            }
        }

        self.loaded_main = self.main.clone();
        self.loaded_next_gen = self.next_gen.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::ConfigLock;
    use crate::node::yaml::parse_document;
    use std::time::Duration;
    use tempfile::TempDir;

    fn doc(text: &str) -> Node {
        parse_document(text).unwrap()
    }

    #[test]
    fn test_routing_by_first_segment() {
        let tree = ConfigTree::from_documents(
            doc("servers:\n- name: s1\n"),
            doc("contexts:\n- name: c1\n"),
        );
        assert!(tree.find(&[Key::sequence("contexts")]).is_some());
        assert!(tree.find(&[Key::sequence("servers")]).is_some());
        assert!(!tree.is_dirty());
    }

    #[test]
    fn test_legacy_routed_keys_are_adopted() {
        let tree = ConfigTree::from_documents(
            doc("current: c1\ncontexts:\n- name: c1\ncurrentContext:\n  kubernetes: c1\n"),
            Node::empty_document(),
        );
        assert!(tree.is_dirty());
        assert!(!tree.main_root().unwrap().contains_key("contexts"));
        assert!(tree.find(&[Key::sequence("contexts")]).is_some());
        assert_eq!(
            tree.merged().keys().collect::<Vec<_>>(),
            vec!["current", "contexts", "currentContext"]
        );
    }

    #[test]
    fn test_next_gen_value_wins_over_legacy_copy() {
        let tree = ConfigTree::from_documents(
            doc("contexts:\n- name: old\n"),
            doc("contexts:\n- name: new\n"),
        );
        let merged = tree.merged();
        let contexts = merged.get("contexts").unwrap();
        assert_eq!(contexts.children[0].get_str("name"), Some("new"));
    }

    #[test]
    fn test_persist_writes_only_changed_documents() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(dir.path());
        std::fs::write(&paths.main, "current: c1\n").unwrap();

        let lock = ConfigLock::new(&paths, Duration::from_secs(5));
        let guard = lock.acquire().unwrap();
        let mut tree = ConfigTree::load(&paths).unwrap();
        let contexts = tree.find_mut(&[Key::sequence("contexts")], true).unwrap();
        contexts.children.push(doc("name: c1\n").content().unwrap().clone());
        tree.persist(&paths, &guard).unwrap();

        assert_eq!(std::fs::read_to_string(&paths.main).unwrap(), "current: c1\n");
        assert_eq!(
            std::fs::read_to_string(&paths.next_gen).unwrap(),
            "contexts:\n- name: c1\n"
        );
        assert!(!tree.is_dirty());
    }
}
