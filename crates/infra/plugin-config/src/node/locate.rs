//! Path lookup inside a node tree.

use super::{Kind, Node, Tag};

/// One step of a path walked by [`find_mut`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub name: String,
    /// Kind to create when the key is missing. `None` accepts any kind and
    /// creates a mapping.
    pub kind: Option<Kind>,
    /// Seed value for a newly created scalar at the end of the path.
    pub value: Option<String>,
}

impl Key {
    pub fn mapping(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(Kind::Mapping),
            value: None,
        }
    }

    pub fn sequence(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(Kind::Sequence),
            value: None,
        }
    }

    pub fn scalar(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(Kind::Scalar),
            value: Some(value.into()),
        }
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            value: None,
        }
    }

    fn create(&self) -> Node {
        match (self.kind, &self.value) {
            (Some(Kind::Scalar), Some(v)) => Node::scalar(Tag::Str, v.clone()),
            (Some(kind), _) => Node::empty_of(kind),
            (None, _) => Node::mapping(),
        }
    }

    fn accepts(&self, node: &Node) -> bool {
        self.kind.is_none_or(|kind| node.kind == kind)
    }
}

/// Dotted form of a path, used in error messages and strategy lookups.
pub fn path_string(path: &[Key]) -> String {
    path.iter()
        .map(|k| k.name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

/// Read-only lookup. Returns `None` as soon as a key is missing or a node
/// has an unexpected kind.
pub fn find<'a>(root: &'a Node, path: &[Key]) -> Option<&'a Node> {
    let mut current = root.content()?;
    for key in path {
        let next = current.get(&key.name)?;
        if !key.accepts(next) {
            return None;
        }
        current = next;
    }
    Some(current)
}

/// Walk `path` from `root`, optionally creating missing nodes.
///
/// With `force_create` unset this never mutates the tree. With it set, each
/// missing key is appended to its parent mapping as an empty node of the
/// key's kind; a null placeholder (`contexts:` with no value) is replaced the
/// same way. An existing node of the wrong kind is never overwritten.
///
/// Callers passing `force_create` must hold the config write lock.
pub fn find_mut<'a>(root: &'a mut Node, path: &[Key], force_create: bool) -> Option<&'a mut Node> {
    if root.kind == Kind::Document && root.children.is_empty() {
        if !force_create {
            return None;
        }
        root.children.push(Node::mapping());
    }

    let mut current = root.content_mut()?;
    if force_create && current.is_null() {
        *current = Node::mapping();
    }

    for key in path {
        if !current.is_mapping() {
            return None;
        }
        let idx = match current.key_index(&key.name) {
            Some(i) => i + 1,
            None => {
                if !force_create {
                    return None;
                }
                current.children.push(Node::string(key.name.clone()));
                current.children.push(key.create());
                current.children.len() - 1
            }
        };

        let next = &mut current.children[idx];
        if force_create && next.is_null() && key.kind != Some(Kind::Scalar) {
            *next = key.create();
        }
        if !key.accepts(next) {
            return None;
        }
        current = next;
    }
    Some(current)
}
