//! The metadata document: patch strategies and free-form settings.
//!
//! ```yaml
//! configMetadata:
//!   patchStrategy:
//!     contexts.clusterOpts: replace
//!   settings:
//!     useUnifiedConfig: "true"
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ConfigStore, decode, force_find_in, require, set_scalar};
use crate::error::{ConfigError, Result};
use crate::node::{self, Key};
use crate::patch::{PatchStrategies, PatchStrategy};
use crate::writer::{read_document, write_document_atomic};

const ROOT: &str = "configMetadata";
const PATCH_STRATEGY: &str = "patchStrategy";
const SETTINGS: &str = "settings";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigMetadata {
    /// Dotted path -> `replace` or `merge`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub patch_strategy: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, String>,
}

impl ConfigStore {
    pub fn get_metadata(&self) -> Result<ConfigMetadata> {
        let doc = read_document(&self.paths.metadata)?;
        match node::find(&doc, &[Key::mapping(ROOT)]) {
            Some(body) => decode(body, "config metadata"),
            None => Ok(ConfigMetadata::default()),
        }
    }

    /// Built-in defaults overlaid with the metadata file's entries.
    pub fn get_patch_strategies(&self) -> Result<PatchStrategies> {
        self.load_patch_strategies()
    }

    pub(crate) fn load_patch_strategies(&self) -> Result<PatchStrategies> {
        let metadata = self.get_metadata()?;
        Ok(PatchStrategies::with_overrides(
            metadata
                .patch_strategy
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        ))
    }

    pub fn set_patch_strategy(&self, path: &str, strategy: PatchStrategy) -> Result<bool> {
        require(path, "patch strategy", "path")?;
        self.update_metadata(PATCH_STRATEGY, path, &strategy.to_string())
    }

    pub fn get_settings(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.get_metadata()?.settings)
    }

    pub fn get_setting(&self, key: &str) -> Result<String> {
        self.get_metadata()?
            .settings
            .remove(key)
            .ok_or_else(|| ConfigError::not_found("setting", key))
    }

    /// `true` iff the setting's value is "true", ignoring case.
    pub fn is_setting_enabled(&self, key: &str) -> Result<bool> {
        Ok(self
            .get_metadata()?
            .settings
            .get(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")))
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<bool> {
        require(key, "setting", "key")?;
        self.update_metadata(SETTINGS, key, value)
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        require(key, "setting", "key")?;
        let _guard = self.lock.acquire()?;
        let mut doc = read_document(&self.paths.metadata)?;
        let removed = node::find_mut(&mut doc, &[Key::mapping(ROOT), Key::mapping(SETTINGS)], false)
            .and_then(|settings| settings.remove(key));
        if removed.is_none() {
            return Err(ConfigError::not_found("setting", key));
        }
        write_document_atomic(&self.paths.metadata, &doc)?;
        tracing::info!("deleted setting '{key}'");
        Ok(())
    }

    fn update_metadata(&self, section: &str, key: &str, value: &str) -> Result<bool> {
        let _guard = self.lock.acquire()?;
        let mut doc = read_document(&self.paths.metadata)?;
        let parent = force_find_in(&mut doc, &[Key::mapping(ROOT), Key::mapping(section)])?;
        if !set_scalar(parent, key, value) {
            tracing::debug!("metadata {section}.{key} unchanged");
            return Ok(false);
        }
        write_document_atomic(&self.paths.metadata, &doc)?;
        tracing::info!("set metadata {section}.{key}");
        Ok(true)
    }
}
