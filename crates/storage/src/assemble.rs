/// Result assembler (C7). Grounded in `original_source/karps/models.py` for
/// the response shapes (`HitResponse`, `SearchResult`, `Header`/
/// `ValueHeader`, `CountResult`) and spec §4.6 for the assembly algorithm.
use std::collections::HashMap;

use query::aggregate::CellField;
use serde::Serialize;
use serde_json::Value;

use crate::decode::{CellValue, ExplodedCell};
use crate::sort::alphanumeric_key;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitResponse {
    pub entry: HashMap<String, Value>,
    pub resource_id: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct SearchResult {
    pub hits: Vec<HitResponse>,
    pub resource_hits: HashMap<String, i64>,
    pub resource_order: Vec<String>,
    pub total: i64,
}

/// One resource's contribution to a search: its field order (for zipping
/// row values into a named `entry`), the rows fetched for this page, and its
/// total hit count from the count probe (used for `resource_hits`/`total`
/// even when this page didn't need to fetch any of its rows).
pub struct ResourceHits {
    pub resource_id: String,
    pub fields: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub total_count: i64,
}

/// Concatenates per-resource hits in resource order, stopping once `size`
/// hits have been emitted (invariant 3: pagination stitching). Resources
/// with zero total hits are recorded in `resource_hits` but excluded from
/// `resource_order` (invariant 2: schema-firewalled/empty resources do not
/// appear in either).
pub fn assemble_search(resources: Vec<ResourceHits>, size: i64) -> SearchResult {
    let mut result = SearchResult::default();
    let mut remaining = size;

    for resource in resources {
        result.total += resource.total_count;
        result.resource_hits.insert(resource.resource_id.clone(), resource.total_count);
        if resource.total_count > 0 {
            result.resource_order.push(resource.resource_id.clone());
        }
        for row in resource.rows {
            if remaining <= 0 {
                break;
            }
            let entry = resource.fields.iter().cloned().zip(row).collect();
            result.hits.push(HitResponse { entry, resource_id: resource.resource_id.clone() });
            remaining -= 1;
        }
    }
    result
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Header {
    #[serde(rename = "compile")]
    Compile { column_field: String },
    #[serde(rename = "total")]
    Total,
    #[serde(rename = "value")]
    Value { header_field: String, header_value: String },
    #[serde(rename = "count")]
    Count { header_field: String, header_value: String },
}

impl Header {
    fn value_header(header_field: &str, header_value: &str, cell_field: &CellField) -> Header {
        if cell_field.is_count() {
            Header::Count { header_field: header_field.to_string(), header_value: header_value.to_string() }
        } else {
            Header::Value { header_field: header_field.to_string(), header_value: header_value.to_string() }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CountCell {
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<CountCellValue>>,
    /// The row's own compile-field scalar (e.g. `entry_word = "eventuell"`),
    /// set only for cells under a `Header::Compile` column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountCellValue {
    pub count: i64,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CountResult {
    pub headers: Vec<Header>,
    pub rows: Vec<Vec<CountCell>>,
    pub total: Vec<CountCell>,
}

/// One decoded aggregation row: the compile-field values (in `compile`
/// order) and its decoded `entry_data` pivot cells.
pub struct AggregateRow {
    pub compile_values: Vec<Value>,
    pub cells: Vec<ExplodedCell>,
}

/// Assembles a [`CountResult`] from decoded aggregation rows plus the
/// grand-totals row, discovering `ValueHeader`s from the observed
/// `(header_field, header_value)` pairs across all rows (invariant 5: header
/// completeness) and sorting them under the shared locale-aware key.
pub fn assemble_count(
    compile: &[String],
    header_field: &str,
    cell_field: &CellField,
    rows: Vec<AggregateRow>,
    totals_row: Option<AggregateRow>,
) -> CountResult {
    let mut headers: Vec<Header> = compile.iter().map(|f| Header::Compile { column_field: f.clone() }).collect();
    headers.push(Header::Total);

    let mut seen: HashMap<String, ()> = HashMap::new();
    let mut value_headers = Vec::new();
    let all_rows: Vec<&AggregateRow> = rows.iter().chain(totals_row.iter()).collect();
    for row in &all_rows {
        for cell in &row.cells {
            let value_str = scalar_to_key_string(&cell.explode_value);
            if seen.insert(value_str.clone(), ()).is_none() {
                value_headers.push((value_str, cell.explode_value.clone()));
            }
        }
    }
    value_headers.sort_by_key(|(k, _)| alphanumeric_key(&format!("{}\u{0}{}", header_field, k)));
    for (value_str, _) in &value_headers {
        headers.push(Header::value_header(header_field, value_str, cell_field));
    }

    let row_values: Vec<Vec<CountCell>> = rows
        .iter()
        .map(|row| build_row_cells(compile, row, &value_headers))
        .collect();
    let total = totals_row.as_ref().map(|row| build_row_cells(&[], row, &value_headers)).unwrap_or_default();

    CountResult { headers, rows: row_values, total }
}

fn build_row_cells(compile: &[String], row: &AggregateRow, value_headers: &[(String, Value)]) -> Vec<CountCell> {
    let mut cells = Vec::with_capacity(compile.len() + 1 + value_headers.len());
    let total_count: i64 = row.cells.iter().map(|c| c.count).sum();
    for i in 0..compile.len() {
        let value = row.compile_values.get(i).cloned();
        cells.push(CountCell { count: 0, values: None, value });
    }
    cells.push(CountCell { count: total_count, values: None, value: None });

    for (value_str, _) in value_headers {
        let found = row.cells.iter().find(|c| scalar_to_key_string(&c.explode_value) == *value_str);
        match found {
            Some(cell) if cell.values.is_empty() => {
                cells.push(CountCell { count: cell.count, values: None, value: None })
            }
            Some(cell) => cells.push(CountCell {
                count: cell.count,
                values: Some(
                    cell.values
                        .iter()
                        .map(|v: &CellValue| CountCellValue { count: v.count, value: v.value.clone() })
                        .collect(),
                ),
                value: None,
            }),
            None => cells.push(CountCell { count: 0, values: None, value: None }),
        }
    }
    cells
}

fn scalar_to_key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ExplodedCell;

    #[test]
    fn test_assemble_search_stops_at_size() {
        let resources = vec![
            ResourceHits {
                resource_id: "ao".into(),
                fields: vec!["entry_word".into()],
                rows: vec![vec![Value::String("a".into())], vec![Value::String("b".into())]],
                total_count: 2,
            },
            ResourceHits {
                resource_id: "saldo".into(),
                fields: vec!["entry_word".into()],
                rows: vec![vec![Value::String("c".into())]],
                total_count: 1,
            },
        ];
        let result = assemble_search(resources, 2);
        assert_eq!(result.hits.len(), 2);
        assert_eq!(result.total, 3);
        assert_eq!(result.resource_order, vec!["ao", "saldo"]);
    }

    #[test]
    fn test_assemble_search_excludes_empty_resources_from_order() {
        let resources = vec![ResourceHits {
            resource_id: "empty".into(),
            fields: vec![],
            rows: vec![],
            total_count: 0,
        }];
        let result = assemble_search(resources, 10);
        assert!(result.resource_order.is_empty());
        assert_eq!(result.resource_hits.get("empty"), Some(&0));
    }

    #[test]
    fn test_assemble_count_discovers_value_headers() {
        let compile = vec!["entry_word".to_string()];
        let row = AggregateRow {
            compile_values: vec![Value::String("eventuell".into())],
            cells: vec![ExplodedCell { explode_value: Value::String("ao".into()), count: 3, values: vec![] }],
        };
        let result = assemble_count(&compile, "resource_id", &CellField::Count, vec![row], None);
        assert_eq!(result.headers.len(), 3); // compile + total + one count header
        assert_eq!(result.rows[0][0].value, Some(Value::String("eventuell".into())));
        assert!(matches!(result.headers[2], Header::Count { .. }));
    }
}
