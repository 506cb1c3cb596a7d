//! In-memory representation of the global field catalogue and per-resource
//! schema, plus the configuration layer that loads them from disk.

pub mod config;
pub mod field;
pub mod resource;

pub use config::{load_field_catalogue, load_resource_configs, Config, DatabaseConfig, ResourcesConfig};
pub use field::{CatalogueError, FieldCatalogue, FieldDescriptor, FieldType, Label};
pub use resource::{EntryWord, ResourceConfig, ResourceConfigError, ResourceField};

use serde::{Deserialize, Serialize};

/// The payload of `GET /config`: every installed resource plus the shared
/// field catalogue and the set of tags observed across resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub resources: Vec<ResourceConfig>,
    pub tags: Vec<String>,
    pub fields: FieldCatalogue,
}

impl ConfigResponse {
    pub fn new(resources: Vec<ResourceConfig>, fields: FieldCatalogue) -> Self {
        let mut tags: Vec<String> = resources
            .iter()
            .flat_map(|r| r.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        Self {
            resources,
            tags,
            fields,
        }
    }
}
