/// Aggregation planner (C5): stacks three nested aggregation levels atop a
/// `UNION ALL` of per-resource plans to produce a pivoted count table with
/// nested per-cell value arrays.
use std::fmt;

use crate::plan::{RenderMode, SortDirection, SqlQuery};

/// `_count` means "count occurrences"; anything else names a data field to
/// collect into the pivot cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellField {
    Count,
    Field(String),
}

impl CellField {
    pub fn from_name(name: &str) -> Self {
        if name == "_count" {
            CellField::Count
        } else {
            CellField::Field(name.to_string())
        }
    }

    pub fn is_count(&self) -> bool {
        matches!(self, CellField::Count)
    }

    pub fn as_field_name(&self) -> Option<&str> {
        match self {
            CellField::Count => None,
            CellField::Field(name) => Some(name.as_str()),
        }
    }
}

impl fmt::Display for CellField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellField::Count => write!(f, "_count"),
            CellField::Field(name) => write!(f, "{}", name),
        }
    }
}

/// A single `columns` parameter pair: the field to explode into pivot
/// columns, and what to collect in each cell.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub explode_field: String,
    pub cell_field: CellField,
}

#[derive(Debug, Clone)]
pub enum AggregateError {
    SortFieldNotInCompile(String),
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateError::SortFieldNotInCompile(field) => {
                write!(f, "sort field \"{}\" is not among the compile fields", field)
            }
        }
    }
}

impl std::error::Error for AggregateError {}

/// Stacks the three aggregation levels described in the design notes atop
/// `per_resource_queries` (each already a `SELECT` over one resource,
/// unioned with `UNION ALL`).
///
/// `compile` is the ordered list of group-by fields; `columns` names the
/// field to explode into pivot columns and what to collect per cell;
/// `sort` is the caller-provided `(field, direction)` list (already stripped
/// of `_default`/bare-order rewriting, which the caller performs using the
/// same substitution rule as for per-resource sort).
pub fn build_aggregate_plan(
    per_resource_queries: Vec<SqlQuery>,
    compile: &[String],
    columns: &ColumnSpec,
    sort: &[(String, SortDirection)],
) -> Result<SqlQuery, AggregateError> {
    let innermost = build_innermost(per_resource_queries, compile, columns);
    let middle = build_middle(innermost, compile, columns);
    let outer = build_outer(middle, compile, columns, sort)?;
    Ok(outer)
}

fn build_innermost(per_resource_queries: Vec<SqlQuery>, compile: &[String], columns: &ColumnSpec) -> SqlQuery {
    let mut q = SqlQuery::from_inner_queries(per_resource_queries).select("COUNT(*)", Some("count"));
    let mut group_by = Vec::new();
    for field in compile {
        q = q.select(field.clone(), None);
        group_by.push(field.clone());
    }
    q = q.select(columns.explode_field.clone(), None);
    group_by.push(columns.explode_field.clone());
    if !columns.cell_field.is_count() {
        let cell_field = columns.cell_field.as_field_name().expect("checked above");
        q = q.select(cell_field.to_string(), None);
        group_by.push(cell_field.to_string());
    }
    q.group_by(group_by)
}

/// Alias used for the JSON-blob column produced at the middle aggregation
/// level. Kept distinct from `explode_field`'s own alias (the bare scalar
/// column emitted alongside it) so the two never collide under one JSON key
/// once the outer level folds them into a single `JSON_OBJECT`; a shared
/// alias would make the scalar unrecoverable after decoding (duplicate JSON
/// object keys collapse to the last occurrence).
fn values_alias(explode_field: &str) -> String {
    format!("{}__values", explode_field)
}

fn build_middle(innermost: SqlQuery, compile: &[String], columns: &ColumnSpec) -> SqlQuery {
    let mut q = SqlQuery::from_inner_queries(vec![innermost]).select("SUM(count)", Some("count"));
    let mut group_by = Vec::new();
    for field in compile {
        q = q.select(field.clone(), None);
        group_by.push(field.clone());
    }
    q = q.select(columns.explode_field.clone(), None);
    group_by.push(columns.explode_field.clone());

    let cell_field_name = columns.cell_field.to_string();
    let json_object = if columns.cell_field.is_count() {
        format!("JSON_OBJECT('{}', count)", cell_field_name)
    } else {
        format!(
            "JSON_OBJECT('{}', {}, 'count', count)",
            cell_field_name,
            columns.cell_field.as_field_name().unwrap()
        )
    };
    q = q.select(
        format!("GROUP_CONCAT({})", json_object),
        Some(values_alias(&columns.explode_field).as_str()),
    );
    q.group_by(group_by)
}

fn build_outer(
    middle: SqlQuery,
    compile: &[String],
    columns: &ColumnSpec,
    sort: &[(String, SortDirection)],
) -> Result<SqlQuery, AggregateError> {
    let mut q = SqlQuery::from_inner_queries(vec![middle]).select("SUM(count)", Some("count"));
    for field in compile {
        q = q.select(field.clone(), None);
    }
    // `{inner}` is a bare GROUP_CONCAT fragment (no enclosing brackets), so it
    // is wrapped before being embedded as a JSON string value — the result is
    // deliberately double-encoded JSON (a string field whose contents parse
    // as a JSON array), decoded with a second parse on the way out.
    let entry_data = format!(
        "CONCAT('[', GROUP_CONCAT(JSON_OBJECT('{explode}', {explode}, 'count', count, 'values', CONCAT('[', {inner}, ']'))), ']')",
        explode = columns.explode_field,
        inner = values_alias(&columns.explode_field),
    );
    q = q.select(entry_data, Some("entry_data"));
    q = q.group_by(compile.to_vec());

    let order = if sort.is_empty() {
        compile.iter().map(|f| (f.clone(), SortDirection::Asc)).collect()
    } else {
        for (field, _) in sort {
            if !compile.iter().any(|c| c == field) {
                return Err(AggregateError::SortFieldNotInCompile(field.clone()));
            }
        }
        sort.to_vec()
    };
    Ok(q.order_by(order))
}

/// The grand-totals aggregation: empty `compile`, `columns = (resource_id,
/// _count)`, one row per resource giving its hit count.
pub fn build_totals_plan(per_resource_queries: Vec<SqlQuery>) -> SqlQuery {
    let columns = ColumnSpec {
        explode_field: "resource_id".to_string(),
        cell_field: CellField::Count,
    };
    let innermost = build_innermost(per_resource_queries, &[], &columns);
    build_middle(innermost, &[], &columns)
}

pub fn render(query: &SqlQuery) -> Result<String, crate::plan::PlanError> {
    query.to_sql(RenderMode::Data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost_counts_without_cell_field() {
        let inner = SqlQuery::from_table("ao").select("'ao'", Some("resource_id")).select("pos", None);
        let columns = ColumnSpec {
            explode_field: "resource_id".into(),
            cell_field: CellField::Count,
        };
        let plan = build_innermost(vec![inner], &["pos".to_string()], &columns);
        assert_eq!(plan.group_by, vec!["pos".to_string(), "resource_id".to_string()]);
    }

    #[test]
    fn test_sort_field_must_be_in_compile() {
        let inner = SqlQuery::from_table("ao");
        let columns = ColumnSpec {
            explode_field: "resource_id".into(),
            cell_field: CellField::Count,
        };
        let err = build_aggregate_plan(
            vec![inner],
            &["pos".to_string()],
            &columns,
            &[("freq".to_string(), SortDirection::Asc)],
        )
        .unwrap_err();
        assert!(matches!(err, AggregateError::SortFieldNotInCompile(_)));
    }

    #[test]
    fn test_default_sort_is_every_compile_field_ascending() {
        let inner = SqlQuery::from_table("ao");
        let columns = ColumnSpec {
            explode_field: "resource_id".into(),
            cell_field: CellField::Count,
        };
        let plan = build_aggregate_plan(vec![inner], &["pos".to_string(), "freq".to_string()], &columns, &[]).unwrap();
        assert_eq!(
            plan.order_by,
            vec![("pos".to_string(), SortDirection::Asc), ("freq".to_string(), SortDirection::Asc)]
        );
    }
}
