//! Text and typed-entity conversion for [`Node`] trees.
//!
//! This is the only place that knows about `serde_yaml`. Parsing keeps
//! mapping order, unknown keys and scalar tags; emitting writes them back in
//! the same order. `serde_yaml` does not surface comments or quoting style,
//! so those are not part of the model.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value, value::TaggedValue};

use super::{Kind, Node, Tag};

/// Parse a YAML document. Blank input yields a document with an empty mapping.
pub fn parse_document(text: &str) -> Result<Node, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(Node::empty_document());
    }
    let value: Value = serde_yaml::from_str(text)?;
    let root = match value {
        Value::Null => Node::mapping(),
        other => from_value(&other),
    };
    Ok(Node::document(root))
}

/// Emit a document (or bare node) as YAML text.
pub fn emit_document(node: &Node) -> Result<String, serde_yaml::Error> {
    let content = node.content().map_or(Value::Null, to_value);
    serde_yaml::to_string(&content)
}

/// Convert a `serde_yaml` value into a node tree.
pub fn from_value(value: &Value) -> Node {
    match value {
        Value::Null => Node::null(),
        Value::Bool(b) => Node::scalar(Tag::Bool, b.to_string()),
        Value::Number(n) => {
            let tag = if n.is_f64() { Tag::Float } else { Tag::Int };
            Node::scalar(tag, n.to_string())
        }
        Value::String(s) => Node::string(s.clone()),
        Value::Sequence(items) => {
            let mut node = Node::sequence();
            node.children = items.iter().map(from_value).collect();
            node
        }
        Value::Mapping(map) => {
            let mut node = Node::mapping();
            for (k, v) in map {
                node.children.push(key_node(k));
                node.children.push(from_value(v));
            }
            node
        }
        Value::Tagged(tagged) => {
            let mut node = from_value(&tagged.value);
            node.tag = Tag::Custom(tagged.tag.to_string());
            node
        }
    }
}

/// Convert a node tree back into a `serde_yaml` value.
pub fn to_value(node: &Node) -> Value {
    let plain = match node.kind {
        Kind::Document => node.content().map_or(Value::Null, to_value),
        Kind::Mapping => {
            let mut map = Mapping::with_capacity(node.children.len() / 2);
            for (k, v) in node.pairs() {
                map.insert(to_value(k), to_value(v));
            }
            Value::Mapping(map)
        }
        Kind::Sequence => Value::Sequence(node.children.iter().map(to_value).collect()),
        Kind::Scalar => scalar_value(node),
    };

    match &node.tag {
        Tag::Custom(tag) => Value::Tagged(Box::new(TaggedValue {
            tag: serde_yaml::value::Tag::new(tag.trim_start_matches('!')),
            value: plain,
        })),
        _ => plain,
    }
}

/// Serialize a typed entity into a node tree.
pub fn from_typed<T: Serialize + ?Sized>(value: &T) -> Result<Node, serde_yaml::Error> {
    Ok(from_value(&serde_yaml::to_value(value)?))
}

/// Deserialize a node tree into a typed entity.
pub fn to_typed<T: DeserializeOwned>(node: &Node) -> Result<T, serde_yaml::Error> {
    serde_yaml::from_value(to_value(node))
}

fn key_node(key: &Value) -> Node {
    match key {
        Value::String(s) => Node::string(s.clone()),
        other => from_value(other),
    }
}

/// Re-resolve a typed scalar through the YAML resolver; anything that does not
/// come back as the recorded type is kept as a string.
fn scalar_value(node: &Node) -> Value {
    let resolved = || serde_yaml::from_str::<Value>(&node.value).ok();
    match node.tag {
        Tag::Null => Value::Null,
        Tag::Bool => match resolved() {
            Some(v @ Value::Bool(_)) => v,
            _ => Value::String(node.value.clone()),
        },
        Tag::Int | Tag::Float => match resolved() {
            Some(v @ Value::Number(_)) => v,
            _ => Value::String(node.value.clone()),
        },
        Tag::Custom(_) => resolved()
            .filter(|v| !matches!(v, Value::Mapping(_) | Value::Sequence(_)))
            .unwrap_or_else(|| Value::String(node.value.clone())),
        Tag::Str | Tag::Map | Tag::Seq => Value::String(node.value.clone()),
    }
}
