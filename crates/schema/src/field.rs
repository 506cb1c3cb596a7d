use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The type a field's values carry.
///
/// `Table` fields are a nested record of sub-fields; sub-fields cannot themselves
/// be tables (enforced by `FieldCatalogue::validate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Table,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }
}

/// Human-readable label, either a single string or a map from language code to string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Plain(String),
    ByLanguage(HashMap<String, String>),
}

/// A global field descriptor: the catalogue entry shared by every resource that
/// declares a field with this name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub collection: bool,
    pub label: Label,
    #[serde(default)]
    pub fields: Option<IndexMap<String, FieldDescriptor>>,
    /// Resources that declare this field; derived, not authoritative from YAML.
    #[serde(default, skip_deserializing)]
    pub resource_id: Vec<String>,
}

impl FieldDescriptor {
    pub fn is_collection(&self) -> bool {
        self.collection
    }
}

/// The global catalogue: every field name that any resource may reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldCatalogue {
    pub fields: IndexMap<String, FieldDescriptor>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("field \"{0}\" references unknown sub-field depth > 1")]
    NestedTable(String),
}

impl FieldCatalogue {
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Enforces the catalogue-level invariant that table sub-fields are flat
    /// (depth <= 1): a `table` field's sub-fields must themselves be scalar.
    pub fn validate(&self) -> Result<(), CatalogueError> {
        for field in self.fields.values() {
            if let Some(sub_fields) = &field.fields {
                for sub in sub_fields.values() {
                    if sub.field_type == FieldType::Table {
                        return Err(CatalogueError::NestedTable(field.name.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Populate `resource_id` on every field from the set of resources declaring it.
    pub fn with_derived_resource_ids(mut self, resources: &[crate::resource::ResourceConfig]) -> Self {
        for field in self.fields.values_mut() {
            field.resource_id = resources
                .iter()
                .filter(|r| r.fields.iter().any(|f| f.name == field.name))
                .map(|r| r.resource_id.clone())
                .collect();
        }
        self
    }
}
