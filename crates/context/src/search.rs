/// Search orchestration (wires C1-C4, C6-C8 together for `GET /search`).
/// Grounded in `original_source/karps/database/database.py`'s
/// `run_paged_searches`: one count probe per resource, a pagination plan,
/// then only the contributing resources are asked for actual rows.
use schema::{FieldCatalogue, FieldType, ResourceConfig};
use serde_json::Value;

use query::plan::{build_resource_plan, RenderMode, Selection};
use storage::{assemble_search, fetch_all, fetch_count, plan_pagination, ResourceHits, SearchResult};

use crate::error::Result;
use crate::params::SearchParams;
use crate::AppContext;

pub async fn search(ctx: &AppContext, params: SearchParams) -> Result<SearchResult> {
    let query = query::parse_query(&params.query)?;
    let candidates = ctx.visible_resources(params.resources.as_deref(), &params.allowed_resources);

    let mut plans = Vec::new();
    for resource in &candidates {
        let selection = match &params.fields {
            Some(fields) => Selection::Fields(fields.clone()),
            None => Selection::All,
        };
        if let Some(plan) = build_resource_plan(&ctx.catalogue, resource, &selection, &query, &params.sort)? {
            let field_names = match &selection {
                Selection::All => resource.fields.iter().map(|f| f.name.clone()).collect(),
                Selection::Fields(fields) => fields.clone(),
            };
            plans.push((resource.clone(), plan, field_names));
        }
    }

    let mut counts = Vec::with_capacity(plans.len());
    for (_, plan, _) in &plans {
        let sql = plan.to_sql(RenderMode::Count)?;
        counts.push(fetch_count(&ctx.pool, &sql).await?);
    }

    let windows = plan_pagination(&counts, params.from, params.size)?;

    let mut resource_hits = Vec::with_capacity(plans.len());
    for ((resource, plan, field_names), (window, total_count)) in
        plans.into_iter().zip(windows.into_iter().zip(counts.into_iter()))
    {
        let rows = match window {
            Some(w) => {
                let paged = plan.limit_offset(w.limit, w.offset);
                let sql = paged.to_sql(RenderMode::Data)?;
                let raw = fetch_all(&ctx.pool, &sql).await?;
                decode_rows(&ctx.catalogue, &resource, &field_names, &raw)
            }
            None => Vec::new(),
        };
        resource_hits.push(ResourceHits {
            resource_id: resource.resource_id.clone(),
            fields: field_names,
            rows,
            total_count,
        });
    }

    Ok(assemble_search(resource_hits, params.size))
}

fn decode_rows(
    catalogue: &FieldCatalogue,
    resource: &ResourceConfig,
    field_names: &[String],
    raw: &storage::QueryRows,
) -> Vec<Vec<Value>> {
    raw.rows
        .iter()
        .map(|row| {
            field_names
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| decode_value(catalogue, resource, name, cell.as_deref()))
                .collect()
        })
        .collect()
}

fn decode_value(catalogue: &FieldCatalogue, resource: &ResourceConfig, name: &str, raw: Option<&str>) -> Value {
    if name == "resource_id" {
        return Value::String(resource.resource_id.clone());
    }
    let resolved = resource.resolve_field(name);
    let descriptor = catalogue.get(resolved);
    let is_collection = descriptor.map(|d| d.collection).unwrap_or(false);
    if is_collection {
        let values = storage::split_collection(raw);
        return Value::Array(values.into_iter().map(Value::String).collect());
    }
    match raw {
        None => Value::Null,
        Some(s) => match descriptor.map(|d| d.field_type) {
            Some(FieldType::Integer) => s.parse::<i64>().map(Value::from).unwrap_or(Value::String(s.to_string())),
            Some(FieldType::Float) => s.parse::<f64>().ok().and_then(serde_json::Number::from_f64).map(Value::Number).unwrap_or(Value::String(s.to_string())),
            _ => Value::String(s.to_string()),
        },
    }
}
