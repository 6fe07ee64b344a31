//! Ordered tree model of a YAML document.
//!
//! A [`Node`] is one of four kinds. Mappings store their entries as
//! interleaved key/value children (`[k0, v0, k1, v1, ...]`) so insertion
//! order is part of the value and survives every load/patch/persist cycle.
//! Sequence order is likewise preserved and never normalised.
//!
//! Conversion to and from text, and to and from typed entities, lives in
//! [`yaml`]. Everything else in the crate works on the style-agnostic shape
//! defined here.

mod locate;
pub mod yaml;

pub use locate::{Key, find, find_mut, path_string};

/// Structural kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Document,
    Mapping,
    Sequence,
    Scalar,
}

/// Type hint carried by a node.
///
/// Scalars keep the YAML core-schema type they were parsed with, so a
/// quoted `"true"` stays a string and `10` stays an integer after a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Map,
    Seq,
    /// Application tag such as `!secret`; wraps the node's own content.
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: Kind,
    pub tag: Tag,
    /// Scalar text. Empty for every other kind.
    pub value: String,
    pub children: Vec<Node>,
}

impl Node {
    /// A document wrapping a single root node.
    pub fn document(root: Node) -> Self {
        Self {
            kind: Kind::Document,
            tag: Tag::Map,
            value: String::new(),
            children: vec![root],
        }
    }

    /// A document whose root is an empty mapping.
    pub fn empty_document() -> Self {
        Self::document(Self::mapping())
    }

    pub fn mapping() -> Self {
        Self {
            kind: Kind::Mapping,
            tag: Tag::Map,
            value: String::new(),
            children: Vec::new(),
        }
    }

    pub fn sequence() -> Self {
        Self {
            kind: Kind::Sequence,
            tag: Tag::Seq,
            value: String::new(),
            children: Vec::new(),
        }
    }

    pub fn scalar(tag: Tag, value: impl Into<String>) -> Self {
        Self {
            kind: Kind::Scalar,
            tag,
            value: value.into(),
            children: Vec::new(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::scalar(Tag::Str, value)
    }

    pub fn null() -> Self {
        Self::scalar(Tag::Null, "null")
    }

    /// An empty node of the given kind. `Scalar` yields an empty string.
    pub fn empty_of(kind: Kind) -> Self {
        match kind {
            Kind::Document => Self::empty_document(),
            Kind::Mapping => Self::mapping(),
            Kind::Sequence => Self::sequence(),
            Kind::Scalar => Self::string(""),
        }
    }

    pub fn is_mapping(&self) -> bool {
        self.kind == Kind::Mapping
    }

    pub fn is_sequence(&self) -> bool {
        self.kind == Kind::Sequence
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == Kind::Scalar
    }

    pub fn is_null(&self) -> bool {
        self.kind == Kind::Scalar && self.tag == Tag::Null
    }

    /// True for empty mappings/sequences/documents and for null scalars.
    pub fn is_empty(&self) -> bool {
        match self.kind {
            Kind::Scalar => self.is_null(),
            Kind::Document => self.children.first().is_none_or(Node::is_empty),
            Kind::Mapping | Kind::Sequence => self.children.is_empty(),
        }
    }

    /// Text of a scalar node.
    pub fn as_str(&self) -> Option<&str> {
        self.is_scalar().then_some(self.value.as_str())
    }

    /// Root content of a document; the node itself for any other kind.
    pub fn content(&self) -> Option<&Node> {
        match self.kind {
            Kind::Document => self.children.first(),
            _ => Some(self),
        }
    }

    pub fn content_mut(&mut self) -> Option<&mut Node> {
        match self.kind {
            Kind::Document => self.children.first_mut(),
            _ => Some(self),
        }
    }

    /// Key/value pairs of a mapping, in document order.
    pub fn pairs(&self) -> impl Iterator<Item = (&Node, &Node)> {
        self.mapping_children()
            .chunks_exact(2)
            .map(|pair| (&pair[0], &pair[1]))
    }

    /// Keys of a mapping, in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs().map(|(k, _)| k.value.as_str())
    }

    /// Index of the *key* child for `key`; the value sits at `index + 1`.
    pub fn key_index(&self, key: &str) -> Option<usize> {
        self.pairs()
            .position(|(k, _)| k.is_scalar() && k.value == key)
            .map(|pair| pair * 2)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.key_index(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.key_index(key).map(|i| &self.children[i + 1])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.key_index(key).map(move |i| &mut self.children[i + 1])
    }

    /// Scalar text stored under `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Node::as_str)
    }

    /// Set `key` to `value`, keeping its position if the key already exists.
    /// Returns the previous value.
    pub fn insert(&mut self, key: &str, value: Node) -> Option<Node> {
        if let Some(i) = self.key_index(key) {
            return Some(std::mem::replace(&mut self.children[i + 1], value));
        }
        self.children.push(Node::string(key));
        self.children.push(value);
        None
    }

    /// Remove `key` and its value. Returns the removed value.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let i = self.key_index(key)?;
        let mut drained = self.children.drain(i..i + 2);
        drained.next();
        drained.next()
    }

    /// A mapping whose children alternate key-scalar/value with unique keys.
    pub fn is_well_formed_mapping(&self) -> bool {
        if !self.is_mapping() || self.children.len() % 2 != 0 {
            return false;
        }
        let mut seen = std::collections::HashSet::new();
        self.pairs()
            .all(|(k, _)| k.is_scalar() && seen.insert(k.value.as_str()))
    }

    /// Equality that ignores core-schema tags on scalars, so an unquoted
    /// `true` on disk matches a typed `"true"`. Application tags still count.
    pub fn same_content(&self, other: &Self) -> bool {
        let custom = |tag: &Tag| matches!(tag, Tag::Custom(_));
        if self.kind != other.kind || self.value != other.value {
            return false;
        }
        if (custom(&self.tag) || custom(&other.tag)) && self.tag != other.tag {
            return false;
        }
        self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_content(b))
    }

    fn mapping_children(&self) -> &[Node] {
        if self.is_mapping() {
            &self.children
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        let mut m = Node::mapping();
        m.insert("b", Node::string("2"));
        m.insert("a", Node::string("1"));
        m
    }

    #[test]
    fn test_insert_appends_in_order() {
        let m = sample();
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(m.children.len(), 4);
    }

    #[test]
    fn test_insert_existing_keeps_position() {
        let mut m = sample();
        let prev = m.insert("b", Node::string("3"));
        assert_eq!(prev, Some(Node::string("2")));
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(m.get_str("b"), Some("3"));
    }

    #[test]
    fn test_remove_drops_pair() {
        let mut m = sample();
        assert_eq!(m.remove("b"), Some(Node::string("2")));
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(m.remove("missing"), None);
    }

    #[test]
    fn test_lookups_on_non_mapping_are_empty() {
        let s = Node::sequence();
        assert_eq!(s.get("a"), None);
        assert_eq!(s.keys().count(), 0);
    }

    #[test]
    fn test_well_formed_mapping() {
        assert!(sample().is_well_formed_mapping());

        let mut odd = sample();
        odd.children.push(Node::string("dangling"));
        assert!(!odd.is_well_formed_mapping());

        let mut dup = sample();
        dup.children.push(Node::string("a"));
        dup.children.push(Node::string("x"));
        assert!(!dup.is_well_formed_mapping());
    }

    #[test]
    fn test_same_content_ignores_core_tags() {
        let plain = Node::scalar(Tag::Bool, "true");
        assert!(plain.same_content(&Node::string("true")));
        assert!(!plain.same_content(&Node::string("false")));

        let secret = Node::scalar(Tag::Custom("!secret".into()), "true");
        assert!(!secret.same_content(&Node::string("true")));
        assert!(secret.same_content(&secret.clone()));

        let mut typed = Node::mapping();
        typed.insert("port", Node::scalar(Tag::Int, "443"));
        let mut text = Node::mapping();
        text.insert("port", Node::string("443"));
        assert!(typed.same_content(&text));
        assert!(!typed.same_content(&sample()));
    }

    #[test]
    fn test_is_empty() {
        assert!(Node::empty_document().is_empty());
        assert!(Node::null().is_empty());
        assert!(!Node::string("").is_empty());
        assert!(!Node::document(sample()).is_empty());
    }
}
