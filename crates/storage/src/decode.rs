/// Row decoding (C6, second half): turns raw driver values into the typed
/// shapes the assembler expects. Grounded in
/// `original_source/karps/database/database.py`'s row-decoding loop inside
/// `run_paged_searches` (`""`-split collection columns, nested
/// `json.loads` on `entry_data`).
use query::aggregate::CellField;
use serde_json::Value;

use crate::error::{KarpsError, Result};

/// `COLLECTION_SEPARATOR`-joined column value to a list; `None`/empty yields
/// an empty list rather than a list containing one empty string.
pub fn split_collection(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(s) if !s.is_empty() => s.split(query::plan::COLLECTION_SEPARATOR).map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// One observed `(explode_value, cell values)` bucket decoded from an
/// aggregation row's `entry_data` column.
#[derive(Debug, Clone)]
pub struct ExplodedCell {
    pub explode_value: Value,
    pub count: i64,
    pub values: Vec<CellValue>,
}

#[derive(Debug, Clone)]
pub struct CellValue {
    pub count: i64,
    pub value: Value,
}

/// Decodes the `entry_data` column produced by `query::aggregate`'s outer
/// level: a JSON array of `{explode_field, count, values}` objects, where
/// `values` is itself a JSON-encoded string (double-encoded, since it
/// originates from a `GROUP_CONCAT` fragment wrapped as a string literal).
///
/// `columns_param` is the original `columns=lhs=rhs` request string, used
/// only to build the truncation error message.
pub fn decode_entry_data(
    raw: &str,
    explode_field: &str,
    cell_field: &CellField,
    cell_field_is_collection: bool,
    columns_param: &str,
) -> Result<Vec<ExplodedCell>> {
    let truncated = || KarpsError::group_concat_truncated(columns_param);

    let elements: Vec<Value> = serde_json::from_str(raw).map_err(|_| truncated())?;
    let mut out = Vec::with_capacity(elements.len());
    for elem in elements {
        let obj = elem.as_object().ok_or_else(truncated)?;
        let explode_value = obj.get(explode_field).cloned().unwrap_or(Value::Null);
        let count = obj.get("count").and_then(Value::as_i64).unwrap_or(0);

        let values = if cell_field.is_count() {
            Vec::new()
        } else {
            let field_name = cell_field.as_field_name().expect("checked by is_count");
            let raw_values = obj.get("values").and_then(Value::as_str).unwrap_or("[]");
            let parsed: Vec<Value> = serde_json::from_str(raw_values).map_err(|_| truncated())?;
            parsed
                .into_iter()
                .filter_map(|v| {
                    let o = v.as_object()?;
                    let count = o.get("count").and_then(Value::as_i64).unwrap_or(0);
                    let mut value = o.get(field_name).cloned().unwrap_or(Value::Null);
                    if cell_field_is_collection {
                        value = Value::Array(
                            split_collection(value.as_str())
                                .into_iter()
                                .map(Value::String)
                                .collect(),
                        );
                    }
                    Some(CellValue { count, value })
                })
                .collect()
        };

        out.push(ExplodedCell { explode_value, count, values });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_collection_empty() {
        assert!(split_collection(None).is_empty());
        assert!(split_collection(Some("")).is_empty());
    }

    #[test]
    fn test_split_collection_values() {
        let raw = format!("a{sep}b{sep}c", sep = query::plan::COLLECTION_SEPARATOR);
        assert_eq!(split_collection(Some(&raw)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_decode_count_cell() {
        let raw = r#"[{"resource_id":"ao","count":5,"values":"[]"}]"#;
        let cells = decode_entry_data(raw, "resource_id", &CellField::Count, false, "resourceId=_count").unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].explode_value, Value::String("ao".to_string()));
        assert_eq!(cells[0].count, 5);
        assert!(cells[0].values.is_empty());
    }

    #[test]
    fn test_decode_value_cell() {
        let cell_field = CellField::Field("pos".to_string());
        let raw = r#"[{"resource_id":"ao","count":3,"values":"[{\"pos\":\"nn\",\"count\":2},{\"pos\":\"vb\",\"count\":1}]"}]"#;
        let cells = decode_entry_data(raw, "resource_id", &cell_field, false, "resourceId=pos").unwrap();
        assert_eq!(cells[0].values.len(), 2);
        assert_eq!(cells[0].values[0].value, Value::String("nn".to_string()));
    }

    #[test]
    fn test_decode_malformed_json_is_truncation_error() {
        let err = decode_entry_data("not json", "resource_id", &CellField::Count, false, "resourceId=_count").unwrap_err();
        assert!(matches!(err, KarpsError::CodeUser { code: 1, .. }));
    }
}
