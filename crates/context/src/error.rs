use thiserror::Error;

/// Wraps every error this layer can surface: storage's already-public
/// [`storage::KarpsError`] for DB/access/decode failures, plus the query
/// crate's parse/compile/plan/aggregate errors, which only ever carry user
/// mistakes (bad DSL, unknown sort field, non-numeric literal).
#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Storage(#[from] storage::KarpsError),

    #[error("{0}")]
    Parse(#[from] query::ParseError),

    #[error("{0}")]
    Plan(#[from] query::plan::PlanError),

    #[error("{0}")]
    Aggregate(#[from] query::aggregate::AggregateError),
}

pub type Result<T> = std::result::Result<T, ContextError>;
