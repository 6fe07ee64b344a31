//! Reading and atomically writing config documents.
//!
//! Writes go through the atomicwrites crate so a document is either fully
//! replaced or left untouched.

use atomicwrites::{AllowOverwrite, AtomicFile};
use std::io::Write;
use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::node::{Node, yaml};

/// Load a YAML document. A missing or blank file is an empty mapping.
pub fn read_document(path: &Path) -> Result<Node> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Node::empty_document()),
        Err(e) => return Err(ConfigError::io(path, e)),
    };
    let doc = yaml::parse_document(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if !doc.content().is_some_and(Node::is_mapping) {
        return Err(ConfigError::InvalidDocument {
            path: path.to_path_buf(),
        });
    }
    Ok(doc)
}

/// Emit `doc` and atomically replace `path` with it.
pub fn write_document_atomic(path: &Path, doc: &Node) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }

    let text = yaml::emit_document(doc)
        .map_err(|e| ConfigError::serialization(path.display().to_string(), e))?;

    let af = AtomicFile::new(path, AllowOverwrite);
    af.write(|f| f.write_all(text.as_bytes()))
        .map_err(|e| ConfigError::io(path, e.into()))?;
    Ok(())
}
