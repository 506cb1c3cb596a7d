use anyhow::{Context, Result};
use config_rs::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::field::FieldCatalogue;
use crate::resource::ResourceConfig;

/// Application-level configuration: database connection and where to find
/// resource/field descriptors on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
}

/// MySQL connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Where the resource/field YAML descriptors live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesConfig {
    #[serde(default = "default_resources_dir")]
    pub dir: String,
    #[serde(default = "default_fields_file")]
    pub fields_file: String,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    3306
}
fn default_user() -> String {
    "karps".to_string()
}
fn default_database() -> String {
    "karps".to_string()
}
fn default_max_connections() -> u32 {
    10
}
fn default_resources_dir() -> String {
    "resources".to_string()
}
fn default_fields_file() -> String {
    "resources/fields.yaml".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            database: default_database(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            dir: default_resources_dir(),
            fields_file: default_fields_file(),
        }
    }
}

impl DatabaseConfig {
    /// MySQL connection URL consumable by `sqlx::MySqlPool::connect`.
    pub fn connection_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

impl Config {
    /// Layered load: defaults, then an optional config file, then `KARPS_*`
    /// environment variables, mirroring the teacher's `Config::load`.
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder()
            .set_default("database.host", default_host())?
            .set_default("database.port", default_port() as i64)?
            .set_default("database.user", default_user())?
            .set_default("database.password", "")?
            .set_default("database.database", default_database())?
            .set_default("database.max_connections", default_max_connections() as i64)?
            .set_default("resources.dir", default_resources_dir())?
            .set_default("resources.fields_file", default_fields_file())?;

        if let Some(file_path) = config_file {
            let path = Path::new(file_path);
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("KARPS")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;
        let app_config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        Ok(app_config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(Some(path.as_ref().to_str().unwrap()))
    }

    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.database.database.is_empty(), "database name cannot be empty");
        anyhow::ensure!(!self.resources.dir.is_empty(), "resources.dir cannot be empty");
        Ok(())
    }
}

/// Reads the global field catalogue from `resources.fields_file`.
pub fn load_field_catalogue(config: &ResourcesConfig) -> Result<FieldCatalogue> {
    let path = Path::new(&config.fields_file);
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading field catalogue {}", path.display()))?;
    let catalogue: FieldCatalogue = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing field catalogue {}", path.display()))?;
    catalogue.validate()?;
    Ok(catalogue)
}

/// Reads every `*.yaml` file in `resources.dir` as a `ResourceConfig`, the way
/// the original Python glob-loaded `resources/*.yaml`.
pub fn load_resource_configs(config: &ResourcesConfig) -> Result<Vec<ResourceConfig>> {
    let dir = Path::new(&config.dir);
    let mut configs = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading resources dir {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }
        if path == Path::new(&config.fields_file) {
            continue;
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading resource descriptor {}", path.display()))?;
        let resource: ResourceConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing resource descriptor {}", path.display()))?;
        resource.validate()?;
        configs.push(resource);
    }
    configs.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));
    Ok(configs)
}
