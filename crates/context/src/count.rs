/// Count/aggregation orchestration (wires C1-C5, C6-C8 for `GET /count`).
/// Grounded in `original_source/karps/database/database.py`'s
/// `add_aggregation`/`get_search` pairing: per-resource `SELECT`s unioned,
/// then stacked through the three aggregation levels.
use schema::{FieldCatalogue, FieldType, ResourceConfig};
use serde_json::Value;

use query::aggregate::{build_aggregate_plan, build_totals_plan, render, CellField, ColumnSpec};
use query::plan::{build_resource_plan, Selection, SortDirection};
use storage::{assemble_count, decode_entry_data, AggregateRow, CountResult, ExplodedCell};

use crate::error::{ContextError, Result};
use crate::params::CountParams;
use crate::AppContext;

pub async fn count(ctx: &AppContext, params: CountParams) -> Result<CountResult> {
    let query = query::parse_query(&params.query)?;
    let candidates = ctx.visible_resources(params.resources.as_deref(), &params.allowed_resources);
    let columns = parse_columns(&params.columns_raw)?;
    let sort = expand_default_sort(&params.sort, &params.compile);

    // `resource_id` is always selected: `build_totals_plan` explodes on it
    // regardless of this request's own `columns` parameter.
    let mut wanted: Vec<String> = params
        .compile
        .iter()
        .cloned()
        .chain(std::iter::once(columns.explode_field.clone()))
        .chain(columns.cell_field.as_field_name().map(|s| s.to_string()))
        .chain(std::iter::once("resource_id".to_string()))
        .collect();
    wanted.sort();
    wanted.dedup();

    let mut per_resource = Vec::new();
    for resource in &candidates {
        if !wanted.iter().all(|f| resource_has_field(resource, f)) {
            continue;
        }
        let selection = Selection::Fields(wanted.clone());
        if let Some(plan) = build_resource_plan(&ctx.catalogue, resource, &selection, &query, &[])? {
            per_resource.push(plan);
        }
    }

    let cell_field_is_collection = columns
        .cell_field
        .as_field_name()
        .and_then(|f| ctx.catalogue.get(f))
        .map(|d| d.collection)
        .unwrap_or(false);

    let totals_plan = build_totals_plan(per_resource.clone());
    let aggregate_plan = build_aggregate_plan(per_resource, &params.compile, &columns, &sort)?;

    let aggregate_sql = render(&aggregate_plan)?;
    let aggregate_rows = storage::fetch_all(&ctx.pool, &aggregate_sql).await?;
    let rows = decode_aggregate_rows(&aggregate_rows, &params.compile, &ctx.catalogue, &columns, cell_field_is_collection, &params.columns_raw)?;

    let totals_sql = render(&totals_plan)?;
    let totals_rows = storage::fetch_all(&ctx.pool, &totals_sql).await?;
    let totals_row = decode_totals_row(&totals_rows, &ctx.catalogue);

    Ok(assemble_count(&params.compile, &columns.explode_field, &columns.cell_field, rows, Some(totals_row)))
}

/// A bare `_default` sort applies to every `compile` field ascending/
/// descending (per spec's sort grammar note: "or every `compile` field for
/// count").
fn expand_default_sort(sort: &[(String, SortDirection)], compile: &[String]) -> Vec<(String, SortDirection)> {
    match sort {
        [(field, dir)] if field == "_default" => compile.iter().map(|f| (f.clone(), *dir)).collect(),
        other => other.to_vec(),
    }
}

fn resource_has_field(resource: &ResourceConfig, name: &str) -> bool {
    name == "resource_id" || resource.has_field(resource.resolve_field(name))
}

fn parse_columns(raw: &str) -> Result<ColumnSpec> {
    let (explode_field, cell_field) = raw
        .split_once('=')
        .ok_or_else(|| ContextError::Storage(storage::KarpsError::User(format!("malformed columns parameter: {}", raw))))?;
    Ok(ColumnSpec {
        explode_field: explode_field.trim().to_string(),
        cell_field: CellField::from_name(cell_field.trim()),
    })
}

fn decode_aggregate_rows(
    raw: &storage::QueryRows,
    compile: &[String],
    catalogue: &FieldCatalogue,
    columns: &ColumnSpec,
    cell_field_is_collection: bool,
    columns_param: &str,
) -> Result<Vec<AggregateRow>> {
    let entry_data_idx = column_index(raw, "entry_data");
    let compile_idx: Vec<usize> = compile.iter().map(|f| column_index(raw, f)).collect();

    let mut out = Vec::with_capacity(raw.rows.len());
    for row in &raw.rows {
        let compile_values = compile_idx
            .iter()
            .zip(compile)
            .map(|(&idx, field)| decode_scalar(catalogue, field, row.get(idx).and_then(|c| c.as_deref())))
            .collect();
        let raw_entry_data = row.get(entry_data_idx).and_then(|c| c.as_deref()).unwrap_or("[]");
        let cells = decode_entry_data(raw_entry_data, &columns.explode_field, &columns.cell_field, cell_field_is_collection, columns_param)?;
        out.push(AggregateRow { compile_values, cells });
    }
    Ok(out)
}

/// Decodes the totals query (stopped at the aggregation's middle level, per
/// `build_totals_plan`'s doc comment): one flat row per explode value,
/// not the nested `entry_data` JSON the outer level produces.
fn decode_totals_row(raw: &storage::QueryRows, catalogue: &FieldCatalogue) -> AggregateRow {
    let count_idx = column_index(raw, "count");
    let explode_idx = column_index(raw, "resource_id");

    let cells = raw
        .rows
        .iter()
        .map(|row| {
            let count = row
                .get(count_idx)
                .and_then(|c| c.as_deref())
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(0);
            let explode_value = decode_scalar(catalogue, "resource_id", row.get(explode_idx).and_then(|c| c.as_deref()));
            ExplodedCell { explode_value, count, values: Vec::new() }
        })
        .collect();
    AggregateRow { compile_values: Vec::new(), cells }
}

fn column_index(raw: &storage::QueryRows, name: &str) -> usize {
    raw.columns.iter().position(|c| c == name).unwrap_or(0)
}

fn decode_scalar(catalogue: &FieldCatalogue, field: &str, raw: Option<&str>) -> Value {
    if field == "resource_id" {
        return raw.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null);
    }
    match raw {
        None => Value::Null,
        Some(s) => match catalogue.get(field).map(|d| d.field_type) {
            Some(FieldType::Integer) => s.parse::<i64>().map(Value::from).unwrap_or(Value::String(s.to_string())),
            Some(FieldType::Float) => s.parse::<f64>().ok().and_then(serde_json::Number::from_f64).map(Value::Number).unwrap_or(Value::String(s.to_string())),
            _ => Value::String(s.to_string()),
        },
    }
}
