use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One of a resource's declared fields, in catalogue order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceField {
    pub name: String,
    #[serde(default)]
    pub primary: bool,
}

/// Names which declared field plays the role of the virtual `entryWord` field
/// for this resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryWord {
    pub field: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Per-resource descriptor, deserialized from one `resources/*.yaml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub resource_id: String,
    pub fields: Vec<ResourceField>,
    pub label: HashMap<String, String>,
    #[serde(default)]
    pub description: Option<String>,
    pub entry_word: EntryWord,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub limited_access: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceConfigError {
    #[error("resource \"{resource_id}\" names entry_word field \"{field}\" which is not among its declared fields")]
    UnknownEntryWord { resource_id: String, field: String },
}

impl ResourceConfig {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Resolves the virtual `entry_word`/`entryWord` field name to this
    /// resource's concrete field.
    pub fn resolve_field<'a>(&'a self, name: &'a str) -> &'a str {
        if name == "entry_word" {
            &self.entry_word.field
        } else {
            name
        }
    }

    /// Enforces `entry_word.field ∈ {f.name | f ∈ fields}`.
    pub fn validate(&self) -> Result<(), ResourceConfigError> {
        if !self.has_field(&self.entry_word.field) {
            return Err(ResourceConfigError::UnknownEntryWord {
                resource_id: self.resource_id.clone(),
                field: self.entry_word.field.clone(),
            });
        }
        Ok(())
    }
}
