/// Relational plan builder (C4): assembles one [`SqlQuery`] per resource,
/// including CTEs for collection-field joins, WHERE clauses, ORDER BY, and
/// paged LIMIT/OFFSET.
use std::fmt;

use indexmap::IndexMap;
use schema::{FieldCatalogue, ResourceConfig};

use crate::ast::{BoolOp, Query};
use crate::compiler::{self, CompileError};

/// `asc`/`desc`, as named in the sort grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Which fields the caller wants in the result row.
#[derive(Debug, Clone)]
pub enum Selection {
    All,
    Fields(Vec<String>),
}

/// What a plan selects rows `FROM`: either a named table, or a list of
/// sub-plans to be combined with `UNION ALL` (used by the aggregation
/// planner to stack levels atop the per-resource union).
#[derive(Debug, Clone)]
pub enum FromClause {
    Table(String),
    InnerQueries(Vec<SqlQuery>),
}

/// Per-collection-field join bookkeeping: whether a predicate filters it
/// (`where_predicate`, feeding the `{field}__where` CTE) and whether it is
/// selected (`want_data`, feeding the `{field}__data` CTE).
#[derive(Debug, Clone, Default)]
pub struct JoinSpec {
    pub where_predicate: Option<String>,
    pub want_data: bool,
    pub alias: Option<String>,
}

/// Whether a render fetches rows (`Data`) or just a row count (`Count`),
/// per spec's "two renderings" for the per-resource search plan: the data
/// form carries collection CTEs/joins and paging, the count form is a bare
/// `SELECT COUNT(*)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Count,
    Data,
}

/// Builder capturing one relational plan. Built per request, rendered to
/// SQL text once, then discarded.
#[derive(Debug, Clone, Default)]
pub struct SqlQuery {
    pub selection: Vec<(String, Option<String>)>,
    pub from: Option<FromClause>,
    pub clauses: Vec<String>,
    pub op: BoolOpOrDefault,
    pub joins: IndexMap<String, JoinSpec>,
    pub group_by: Vec<String>,
    pub order_by: Vec<(String, SortDirection)>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// `BoolOp` with a `Default` impl (`And`), so `SqlQuery` can derive `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolOpOrDefault(pub BoolOp);

impl Default for BoolOpOrDefault {
    fn default() -> Self {
        BoolOpOrDefault(BoolOp::And)
    }
}

#[derive(Debug, Clone)]
pub enum PlanError {
    Compile(CompileError),
    UnknownSortField(String),
    MissingFrom,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::Compile(e) => write!(f, "{}", e),
            PlanError::UnknownSortField(field) => {
                write!(f, "Sort by \"{}\" is not supported in this resource", field)
            }
            PlanError::MissingFrom => write!(f, "SQL generation received neither table nor inner queries"),
        }
    }
}

impl std::error::Error for PlanError {}

impl From<CompileError> for PlanError {
    fn from(e: CompileError) -> Self {
        PlanError::Compile(e)
    }
}

pub const COLLECTION_SEPARATOR: char = '\u{1f}';

impl SqlQuery {
    pub fn from_table(table: impl Into<String>) -> Self {
        SqlQuery {
            from: Some(FromClause::Table(table.into())),
            ..Default::default()
        }
    }

    pub fn from_inner_queries(queries: Vec<SqlQuery>) -> Self {
        SqlQuery {
            from: Some(FromClause::InnerQueries(queries)),
            ..Default::default()
        }
    }

    pub fn select(mut self, expr: impl Into<String>, alias: Option<&str>) -> Self {
        self.selection.push((expr.into(), alias.map(|a| a.to_string())));
        self
    }

    pub fn group_by(mut self, cols: Vec<String>) -> Self {
        self.group_by = cols;
        self
    }

    pub fn order_by(mut self, order: Vec<(String, SortDirection)>) -> Self {
        self.order_by = order;
        self
    }

    pub fn limit_offset(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    pub fn to_sql(&self, mode: RenderMode) -> Result<String, PlanError> {
        match &self.from {
            Some(FromClause::Table(table)) => Ok(self.render_table_query(table, mode)),
            Some(FromClause::InnerQueries(children)) => self.render_union_query(children),
            None => Err(PlanError::MissingFrom),
        }
    }

    fn render_table_query(&self, table: &str, mode: RenderMode) -> String {
        let mut ctes = Vec::new();
        for (field, spec) in &self.joins {
            if let Some(pred) = &spec.where_predicate {
                ctes.push(format!(
                    "{field}__where AS (SELECT __parent_id FROM {table}__{field} WHERE {pred} GROUP BY __parent_id)",
                    field = field,
                    table = table,
                    pred = pred,
                ));
            }
            if spec.want_data && mode == RenderMode::Data {
                let alias = spec.alias.clone().unwrap_or_else(|| field.clone());
                ctes.push(format!(
                    "{field}__data AS (SELECT __parent_id, GROUP_CONCAT(value SEPARATOR '{sep}') AS {alias} FROM {table}__{field} GROUP BY __parent_id)",
                    field = field,
                    table = table,
                    alias = alias,
                    sep = COLLECTION_SEPARATOR,
                ));
            }
        }

        let selection = match mode {
            RenderMode::Count => "COUNT(*)".to_string(),
            RenderMode::Data => render_selection(&self.selection),
        };

        let mut sql = String::new();
        if !ctes.is_empty() {
            sql.push_str("WITH ");
            sql.push_str(&ctes.join(",\n"));
            sql.push('\n');
        }
        sql.push_str(&format!("SELECT {} FROM {}", selection, quote_ident(table)));

        if mode == RenderMode::Data {
            for (field, spec) in &self.joins {
                if spec.want_data {
                    sql.push_str(&format!(
                        " LEFT JOIN {field}__data ON {field}__data.__parent_id = __id",
                        field = field
                    ));
                }
            }
        }

        if !self.clauses.is_empty() {
            let joiner = format!(" {} ", self.op.0.sql_keyword());
            sql.push_str(" WHERE ");
            sql.push_str(&self.clauses.join(&joiner));
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&render_idents(&self.group_by));
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&render_order_by(&self.order_by));
        }

        if mode == RenderMode::Data {
            if let Some(limit) = self.limit {
                sql.push_str(&format!(" LIMIT {}", limit));
                if let Some(offset) = self.offset {
                    sql.push_str(&format!(" OFFSET {}", offset));
                }
            }
        }

        sql
    }

    fn render_union_query(&self, children: &[SqlQuery]) -> Result<String, PlanError> {
        let mut rendered = Vec::with_capacity(children.len());
        for child in children {
            rendered.push(format!("({})", child.to_sql(RenderMode::Data)?));
        }
        let union = rendered.join("\nUNION ALL\n");
        let selection = render_selection(&self.selection);
        let mut sql = format!("SELECT {} FROM ({}) AS innerq", selection, union);

        if !self.clauses.is_empty() {
            let joiner = format!(" {} ", self.op.0.sql_keyword());
            sql.push_str(" WHERE ");
            sql.push_str(&self.clauses.join(&joiner));
        }
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&render_idents(&self.group_by));
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&render_order_by(&self.order_by));
        }
        Ok(sql)
    }
}

fn render_selection(items: &[(String, Option<String>)]) -> String {
    items
        .iter()
        .map(|(expr, alias)| match alias {
            Some(a) => format!("{} AS {}", render_select_expr(expr), quote_ident(a)),
            None => render_select_expr(expr),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_select_expr(expr: &str) -> String {
    if is_passthrough(expr) {
        expr.to_string()
    } else {
        quote_ident(expr)
    }
}

fn is_passthrough(expr: &str) -> bool {
    let trimmed = expr.trim_start();
    trimmed.starts_with('\'')
        || trimmed.starts_with('"')
        || ["COUNT(", "SUM(", "GROUP_CONCAT(", "CONCAT("]
            .iter()
            .any(|p| trimmed.starts_with(p))
}

fn render_idents(cols: &[String]) -> String {
    cols.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ")
}

fn render_order_by(order: &[(String, SortDirection)]) -> String {
    order
        .iter()
        .map(|(field, dir)| match dir {
            // Ascending order is the default; no ASC keyword is emitted.
            SortDirection::Asc => quote_ident(field),
            SortDirection::Desc => format!("{} DESC", quote_ident(field)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn quote_ident(name: &str) -> String {
    compiler::quote_ident(name)
}

/// Builds the per-resource plan for a search request. Returns `Ok(None)`
/// when the resource must be dropped from the result set because the query
/// references a field the resource does not declare (the schema firewall).
pub fn build_resource_plan(
    catalogue: &FieldCatalogue,
    resource: &ResourceConfig,
    selection: &Selection,
    query: &Query,
    sort: &[(String, SortDirection)],
) -> Result<Option<SqlQuery>, PlanError> {
    // Schema firewall: a predicate referencing a field absent from this
    // resource drops the resource entirely, not an error.
    for clause in &query.clauses {
        let resolved = resource.resolve_field(&clause.field);
        if !resource.has_field(resolved) {
            return Ok(None);
        }
    }

    let compiled = compiler::compile_query(catalogue, resource, query)?;

    let mut builder = SqlQuery::from_table(resource.resource_id.clone());
    builder.op = BoolOpOrDefault(compiled.op);

    let mut joins: IndexMap<String, JoinSpec> = IndexMap::new();
    for (field, fragment) in compiled.fragments {
        let is_collection = catalogue.get(&field).map(|d| d.collection).unwrap_or(false);
        if is_collection {
            let entry = joins.entry(field.clone()).or_default();
            entry.where_predicate = Some(fragment);
            builder.clauses.push(format!("EXISTS (SELECT 1 FROM {field}__where WHERE __id = __parent_id)", field = field));
        } else {
            builder.clauses.push(fragment);
        }
    }

    let field_names: Vec<String> = match selection {
        Selection::All => resource.fields.iter().map(|f| f.name.clone()).collect(),
        Selection::Fields(fields) => fields.clone(),
    };

    for name in &field_names {
        match name.as_str() {
            "resource_id" => {
                builder = builder.select(format!("'{}'", resource.resource_id), Some("resource_id"));
            }
            "entry_word" => {
                builder = builder.select(resource.entry_word.field.clone(), Some("entry_word"));
            }
            other => {
                let is_collection = catalogue.get(other).map(|d| d.collection).unwrap_or(false);
                if is_collection {
                    let entry = joins.entry(other.to_string()).or_default();
                    entry.want_data = true;
                    entry.alias.get_or_insert_with(|| other.to_string());
                }
                builder = builder.select(other.to_string(), None);
            }
        }
    }
    builder.joins = joins;

    let resolved_sort: Result<Vec<(String, SortDirection)>, PlanError> = if sort.is_empty() {
        Ok(vec![(resource.entry_word.field.clone(), SortDirection::Asc)])
    } else {
        sort.iter()
            .map(|(field, dir)| {
                let resolved = if field == "_default" {
                    resource.entry_word.field.clone()
                } else if !resource.has_field(field) {
                    return Err(PlanError::UnknownSortField(field.clone()));
                } else {
                    field.clone()
                };
                Ok((resolved, *dir))
            })
            .collect()
    };
    builder.order_by = resolved_sort?;

    Ok(Some(builder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use schema::{EntryWord, FieldDescriptor, FieldType, Label, ResourceField};
    use std::collections::HashMap;

    fn catalogue() -> FieldCatalogue {
        let mut fields = IndexMap::new();
        fields.insert("entry_word".to_string(), field("entry_word", FieldType::Text, false));
        fields.insert("senses".to_string(), field("senses", FieldType::Text, true));
        fields.insert("pos".to_string(), field("pos", FieldType::Text, false));
        FieldCatalogue { fields }
    }

    fn field(name: &str, field_type: FieldType, collection: bool) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            field_type,
            collection,
            label: Label::Plain(name.to_string()),
            fields: None,
            resource_id: vec![],
        }
    }

    fn resource() -> ResourceConfig {
        ResourceConfig {
            resource_id: "ao".into(),
            fields: vec![
                ResourceField { name: "entry_word".into(), primary: true },
                ResourceField { name: "senses".into(), primary: false },
            ],
            label: HashMap::new(),
            description: None,
            entry_word: EntryWord { field: "entry_word".into(), description: None },
            updated: None,
            size: None,
            link: None,
            tags: vec![],
            limited_access: false,
        }
    }

    #[test]
    fn test_schema_firewall_drops_resource() {
        let query = Parser::parse("equals|pos|nn").unwrap();
        let plan = build_resource_plan(&catalogue(), &resource(), &Selection::All, &query, &[]).unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn test_collection_predicate_uses_exists_not_join() {
        // S5: a predicate on a collection field compiles to an EXISTS over
        // a `{field}__where` CTE, not an inner JOIN.
        let query = Parser::parse("contains|senses|water").unwrap();
        let plan = build_resource_plan(&catalogue(), &resource(), &Selection::All, &query, &[])
            .unwrap()
            .unwrap();
        let sql = plan.to_sql(RenderMode::Data).unwrap();
        assert!(sql.contains("senses__where"));
        assert!(sql.contains("EXISTS (SELECT 1 FROM senses__where"));
        assert!(!sql.contains("JOIN senses__where"));
        // `ao__senses` only has columns (__parent_id, value); the predicate
        // must target `value`, not the field name `senses`.
        assert!(sql.contains("WHERE `value` LIKE '%water%' GROUP BY __parent_id"));
        assert!(!sql.contains("`senses` LIKE"));
    }

    #[test]
    fn test_default_sort_uses_entry_word() {
        let query = Query::empty();
        let plan = build_resource_plan(&catalogue(), &resource(), &Selection::All, &query, &[])
            .unwrap()
            .unwrap();
        assert_eq!(plan.order_by, vec![("entry_word".to_string(), SortDirection::Asc)]);
    }

    #[test]
    fn test_unknown_sort_field_errors() {
        let query = Query::empty();
        let err = build_resource_plan(
            &catalogue(),
            &resource(),
            &Selection::All,
            &query,
            &[("bogus".to_string(), SortDirection::Asc)],
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::UnknownSortField(_)));
    }

    #[test]
    fn test_count_mode_has_no_limit_or_joins() {
        let query = Query::empty();
        let plan = build_resource_plan(&catalogue(), &resource(), &Selection::All, &query, &[])
            .unwrap()
            .unwrap()
            .limit_offset(10, 0);
        let sql = plan.to_sql(RenderMode::Count).unwrap();
        assert!(sql.starts_with("SELECT COUNT(*)"));
        assert!(!sql.contains("LIMIT"));
    }
}
