/// Fixture helpers for the integration tests: a small in-memory catalogue and
/// resource set standing in for the `ao`/`saldo` lexical resources named in
/// the scenario table, plus decoded-row builders that stand in for what a
/// live `sqlx` fetch would have returned (no database is started for these
/// tests — see the fixture note in the aggregation design).
use std::collections::HashMap;

use schema::{FieldCatalogue, FieldDescriptor, FieldType, Label, ResourceConfig, ResourceField};
use serde_json::Value;

pub fn catalogue() -> FieldCatalogue {
    let mut fields = indexmap::IndexMap::new();
    fields.insert(
        "entry_word".to_string(),
        FieldDescriptor {
            name: "entry_word".to_string(),
            field_type: FieldType::Text,
            collection: false,
            label: Label::Plain("Entry word".to_string()),
            fields: None,
            resource_id: Vec::new(),
        },
    );
    fields.insert(
        "part_of_speech".to_string(),
        FieldDescriptor {
            name: "part_of_speech".to_string(),
            field_type: FieldType::Text,
            collection: false,
            label: Label::Plain("Part of speech".to_string()),
            fields: None,
            resource_id: Vec::new(),
        },
    );
    FieldCatalogue { fields }
}

pub fn resource_ao() -> ResourceConfig {
    ResourceConfig {
        resource_id: "ao".to_string(),
        fields: vec![ResourceField { name: "entry_word".to_string(), primary: true }],
        label: HashMap::from([("eng".to_string(), "AO".to_string())]),
        description: None,
        entry_word: schema::EntryWord { field: "entry_word".to_string(), description: None },
        updated: None,
        size: None,
        link: None,
        tags: Vec::new(),
        limited_access: false,
    }
}

pub fn resource_saldo() -> ResourceConfig {
    ResourceConfig {
        resource_id: "saldo".to_string(),
        fields: vec![
            ResourceField { name: "entry_word".to_string(), primary: true },
            ResourceField { name: "part_of_speech".to_string(), primary: false },
        ],
        label: HashMap::from([("eng".to_string(), "SALDO".to_string())]),
        description: None,
        entry_word: schema::EntryWord { field: "entry_word".to_string(), description: None },
        updated: None,
        size: None,
        link: None,
        tags: Vec::new(),
        limited_access: false,
    }
}

/// Builds a single search hit the way `context::search::decode_rows` would
/// have, for a resource whose only field is `entry_word`.
pub fn hit(resource_id: &str, entry_word: &str) -> storage::HitResponse {
    storage::HitResponse {
        entry: HashMap::from([("entry_word".to_string(), Value::String(entry_word.to_string()))]),
        resource_id: resource_id.to_string(),
    }
}
