//! Typed predicate tree produced by the parser and consumed by the compiler.
use std::fmt;

/// How sibling clauses of a [`Query`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn sql_keyword(self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => write!(f, "and"),
            BoolOp::Or => write!(f, "or"),
        }
    }
}

/// The comparison operator named by a single subquery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Equals,
    StartsWith,
    EndsWith,
    Contains,
    Regexp,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl PredicateOp {
    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s {
            "equals" => PredicateOp::Equals,
            "startswith" => PredicateOp::StartsWith,
            "endswith" => PredicateOp::EndsWith,
            "contains" => PredicateOp::Contains,
            "regexp" => PredicateOp::Regexp,
            "lt" => PredicateOp::Lt,
            "lte" => PredicateOp::Lte,
            "gt" => PredicateOp::Gt,
            "gte" => PredicateOp::Gte,
            _ => return None,
        })
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, PredicateOp::Lt | PredicateOp::Lte | PredicateOp::Gt | PredicateOp::Gte)
    }
}

impl fmt::Display for PredicateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PredicateOp::Equals => "equals",
            PredicateOp::StartsWith => "startswith",
            PredicateOp::EndsWith => "endswith",
            PredicateOp::Contains => "contains",
            PredicateOp::Regexp => "regexp",
            PredicateOp::Lt => "lt",
            PredicateOp::Lte => "lte",
            PredicateOp::Gt => "gt",
            PredicateOp::Gte => "gte",
        };
        write!(f, "{}", name)
    }
}

/// A single `op|field|value` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubQuery {
    pub op: PredicateOp,
    pub field: String,
    pub value: String,
}

/// The root of a parsed query: a boolean operator combining sibling predicates.
/// Nested boolean groups are not part of the grammar (see Open Questions in
/// the design notes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub op: BoolOp,
    pub clauses: Vec<SubQuery>,
}

impl Query {
    pub fn empty() -> Self {
        Query {
            op: BoolOp::And,
            clauses: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}
