//! File-backed YAML configuration store shared by CLI plugin processes.
//!
//! This crate provides:
//! - [`ConfigStore`]: locked, patch-based reads and writes of contexts,
//!   servers, certs, discovery sources and client options
//! - [`node`]: an order-preserving YAML node tree with path lookup
//! - [`patch`]: the patch-merge engine (replace/merge strategies, variant
//!   matching for one-of list elements)
//! - [`locks`]: in-process mutex plus cross-process advisory file locks
//! - [`schema`]: JSON Schema generation for the client config document
//! - [`validation`]: advisory validation that produces warnings
//!
//! Data is split over two files: contexts and current-context pointers live
//! in the secondary ("next-gen") file, everything else in the primary file.
//! Contexts that older readers understand as servers are mirrored into the
//! primary file's `servers` list.
//!
//! # Example
//! ```no_run
//! use plugin_config::{ConfigStore, Context, ContextType};
//!
//! let store = ConfigStore::from_env().unwrap();
//! let ctx = Context::new("dev", ContextType::Kubernetes);
//! store.set_context(&ctx, true).unwrap();
//! assert_eq!(
//!     store.get_current_context(&ContextType::Kubernetes).unwrap().name,
//!     "dev"
//! );
//! ```
//!
//! # Environment Variables
//! - `PLUGIN_CONFIG`: primary config file
//! - `PLUGIN_CONFIG_NEXT_GEN`: secondary config file
//! - `PLUGIN_CONFIG_METADATA`: metadata file (patch strategies, settings)
//! - `PLUGIN_CONFIG_LOCK_TIMEOUT_SECS`: lock wait before giving up

pub mod active_resource;
pub mod bridge;
pub mod error;
pub mod locks;
pub mod node;
pub mod patch;
pub mod paths;
pub mod schema;
pub mod store;
pub mod types;
pub mod validation;
pub mod writer;

// Re-exports for convenient access
pub use active_resource::{
    ActiveResource, ActiveResourceOptions, ActiveResourceSync, CliActiveResourceSync,
    NoopActiveResourceSync,
};
pub use error::{ConfigError, Result};
pub use locks::{ConfigLock, LockGuard};
pub use patch::{PatchStrategies, PatchStrategy};
pub use paths::ConfigPaths;
pub use schema::schema_json_pretty;
pub use store::{ConfigMetadata, ConfigStore, ConfigStoreBuilder};
pub use types::{
    Cert, ClientConfig, Context, ContextType, DiscoverySource, PluginDiscovery, Server,
    ServerType, Target,
};
pub use validation::{AdvisoryWarning, validate};
