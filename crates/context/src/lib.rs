/// Orchestration layer: wires `schema` (catalogue/config), `query`
/// (parse/compile/plan/aggregate) and `storage` (execute/decode/assemble)
/// into the two entry points the outer crates (`querier`, `cli`) call.
///
/// Grounded in the teacher's `create_context`/`execute_query` shape (load
/// config, register resources, run a query, return a result) generalized
/// from DataFusion session setup to a Karp-s MySQL pool.
pub mod error;
pub mod params;
pub mod search;
pub mod count;

use std::collections::HashSet;
use std::sync::Arc;

use schema::{Config, FieldCatalogue, ResourceConfig};
use sqlx::MySqlPool;
use tracing::info;

pub use error::{ContextError, Result};
pub use params::{SearchParams, CountParams};

/// Everything a request needs: the resolved configuration, schema, and a
/// live connection pool. Cheap to clone (pool is an `Arc` internally,
/// catalogue/resources are wrapped in `Arc` here too).
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub catalogue: Arc<FieldCatalogue>,
    pub resources: Arc<Vec<ResourceConfig>>,
    pub pool: MySqlPool,
}

impl AppContext {
    /// Loads configuration from `config_file` (or environment variables if
    /// `None`), reads the field catalogue and resource descriptors from
    /// disk, and opens the database pool.
    pub async fn new(config_file: Option<&str>) -> anyhow::Result<Self> {
        let config = Config::load(config_file)?;
        config.validate()?;

        if let Some(file) = config_file {
            info!("loaded configuration from: {}", file);
        } else {
            info!("loaded configuration from environment variables");
        }

        let catalogue = schema::load_field_catalogue(&config.resources)?;
        let mut resources = schema::load_resource_configs(&config.resources)?;
        resources.sort_by(|a, b| {
            storage::sort::alphanumeric_key(&a.resource_id).cmp(&storage::sort::alphanumeric_key(&b.resource_id))
        });
        let catalogue = catalogue.with_derived_resource_ids(&resources);

        info!("loaded {} resources, {} catalogue fields", resources.len(), catalogue.fields.len());

        let pool = storage::create_pool(&config.database).await?;

        Ok(Self {
            config: Arc::new(config),
            catalogue: Arc::new(catalogue),
            resources: Arc::new(resources),
            pool,
        })
    }

    /// Resources the caller may read, filtered by the C8 access grant and
    /// narrowed to an explicit `resources` allow-list when one is given.
    pub fn visible_resources(&self, requested: Option<&[String]>, allowed: &HashSet<String>) -> Vec<ResourceConfig> {
        let filtered = storage::filter_allowed(&self.resources, allowed);
        filtered
            .into_iter()
            .filter(|r| requested.map(|names| names.iter().any(|n| n == &r.resource_id)).unwrap_or(true))
            .cloned()
            .collect()
    }
}
