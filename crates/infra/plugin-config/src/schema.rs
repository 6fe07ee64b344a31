//! JSON Schema generation for the client config document.

use crate::store::ConfigMetadata;
use crate::types::ClientConfig;
use schemars::{Schema, generate::SchemaSettings};

/// Schema of the merged client config document.
pub fn schema() -> Schema {
    SchemaSettings::default()
        .into_generator()
        .into_root_schema_for::<ClientConfig>()
}

/// Schema of the `configMetadata` section of the metadata file.
pub fn metadata_schema() -> Schema {
    SchemaSettings::default()
        .into_generator()
        .into_root_schema_for::<ConfigMetadata>()
}

pub fn schema_json_pretty() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schema())
}
