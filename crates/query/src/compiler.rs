/// Predicate compiler (C3): translates a [`Query`] into SQL fragments,
/// dispatching on field type (numeric vs. text).
use std::fmt;

use schema::{FieldCatalogue, FieldType, ResourceConfig};

use crate::ast::{BoolOp, PredicateOp, Query, SubQuery};

/// Numeric tolerance used for float/integer comparisons. A single constant,
/// per the design notes; magnitude-aware epsilon is not implemented.
pub const EPSILON: f64 = 0.01;

#[derive(Debug, Clone)]
pub enum CompileError {
    /// A user error: the parser accepted an operator that is not valid for
    /// a numeric field (e.g. `contains` on a `float`).
    UnsupportedNumericOp { op: PredicateOp, field: String },
    /// A user error: the predicate's value does not parse as a number for a
    /// numeric field.
    InvalidNumericLiteral { field: String, value: String },
    /// An internal error: the parser produced an operator this compiler
    /// does not recognise, which should not occur if the grammar and the
    /// compiler's operator coverage stay in sync.
    UnknownOperator(PredicateOp),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnsupportedNumericOp { op, field } => {
                write!(f, "unsupported operator \"{}\" for numeric field \"{}\"", op, field)
            }
            CompileError::InvalidNumericLiteral { field, value } => {
                write!(f, "value \"{}\" is not numeric for field \"{}\"", value, field)
            }
            CompileError::UnknownOperator(op) => write!(f, "unknown operator in query: {}", op),
        }
    }
}

impl std::error::Error for CompileError {}

/// Output of compiling a [`Query`] against one resource: the boolean
/// operator joining sibling clauses, and one rendered SQL fragment per
/// clause, paired with the (resolved) field name it applies to.
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    pub op: BoolOp,
    pub fragments: Vec<(String, String)>,
}

/// Compiles `query` against `resource`, rewriting the virtual `entry_word`
/// field to the resource's designated entry-word field before looking up
/// its type. Callers are expected to have already checked that every
/// referenced field exists on `resource` (the schema firewall in the plan
/// builder) — this function assumes that invariant holds.
pub fn compile_query(
    catalogue: &FieldCatalogue,
    resource: &ResourceConfig,
    query: &Query,
) -> Result<CompiledPredicate, CompileError> {
    let mut fragments = Vec::with_capacity(query.clauses.len());
    for clause in &query.clauses {
        let field_name = resource.resolve_field(&clause.field).to_string();
        let descriptor = catalogue.get(&field_name);
        let field_type = descriptor.map(|d| d.field_type).unwrap_or(FieldType::Text);
        // Collection fields live in a child table `{resource}__{field}` whose
        // only columns are `(__parent_id, value)` — the predicate must target
        // the literal `value` column, never the field's own name.
        let is_collection = descriptor.map(|d| d.collection).unwrap_or(false);
        let db_column = if is_collection { "value" } else { field_name.as_str() };
        let fragment = compile_clause(db_column, field_name.as_str(), field_type, clause)?;
        fragments.push((field_name, fragment));
    }
    Ok(CompiledPredicate { op: query.op, fragments })
}

fn compile_clause(db_column: &str, field_name: &str, field_type: FieldType, clause: &SubQuery) -> Result<String, CompileError> {
    if field_type.is_numeric() {
        compile_numeric_clause(db_column, field_name, clause)
    } else {
        compile_text_clause(db_column, clause)
    }
}

fn compile_numeric_clause(db_column: &str, field_name: &str, clause: &SubQuery) -> Result<String, CompileError> {
    let value: f64 = clause.value.trim().parse().map_err(|_| CompileError::InvalidNumericLiteral {
        field: field_name.to_string(),
        value: clause.value.clone(),
    })?;
    let column = quote_ident(db_column);
    let fragment = match clause.op {
        PredicateOp::Equals => format!("ABS({} - {}) < {}", column, fmt_num(value), fmt_num(EPSILON)),
        PredicateOp::Lt => format!("{} < {}", column, fmt_num(value - EPSILON)),
        PredicateOp::Lte => format!("{} < {}", column, fmt_num(value + EPSILON)),
        PredicateOp::Gt => format!("{} > {}", column, fmt_num(value + EPSILON)),
        PredicateOp::Gte => format!("{} > {}", column, fmt_num(value - EPSILON)),
        PredicateOp::StartsWith | PredicateOp::EndsWith | PredicateOp::Contains | PredicateOp::Regexp => {
            return Err(CompileError::UnsupportedNumericOp {
                op: clause.op,
                field: field_name.to_string(),
            })
        }
    };
    Ok(fragment)
}

fn compile_text_clause(db_column: &str, clause: &SubQuery) -> Result<String, CompileError> {
    let escaped = escape_single_quote(&clause.value);
    let column = quote_ident(db_column);
    let fragment = match clause.op {
        PredicateOp::Equals => format!("{} = '{}'", column, escaped),
        PredicateOp::StartsWith => format!("{} LIKE '{}%'", column, escaped),
        PredicateOp::EndsWith => format!("{} LIKE '%{}'", column, escaped),
        PredicateOp::Contains => format!("{} LIKE '%{}%'", column, escaped),
        PredicateOp::Regexp => format!("{} REGEXP '{}'", column, escaped),
        PredicateOp::Lt => format!("{} < '{}'", column, escaped),
        PredicateOp::Lte => format!("{} <= '{}'", column, escaped),
        PredicateOp::Gt => format!("{} > '{}'", column, escaped),
        PredicateOp::Gte => format!("{} >= '{}'", column, escaped),
    };
    Ok(fragment)
}

fn fmt_num(v: f64) -> String {
    // Trim a trailing ".0" so integer-valued floats render the way the
    // original SQL literals did.
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

pub fn escape_single_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name)
}
