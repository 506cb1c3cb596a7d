/// The Karp-s query DSL: a pipe-delimited boolean algebra over field/op/value
/// predicates, compiled against a per-resource schema into a relational plan.
///
/// # Architecture
///
/// 1. **Lexer** (`lexer.rs`) - tokenizes the query DSL.
/// 2. **Parser** (`parser.rs`) - builds the predicate tree (`ast.rs`) from tokens.
/// 3. **Compiler** (`compiler.rs`) - translates predicates into SQL fragments.
/// 4. **Plan** (`plan.rs`) - assembles per-resource `SELECT` statements.
/// 5. **Aggregate** (`aggregate.rs`) - stacks the three-level pivot aggregation.
pub mod aggregate;
pub mod ast;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod plan;

pub use ast::{BoolOp, PredicateOp, Query, SubQuery};
pub use compiler::{compile_query, CompileError, CompiledPredicate, EPSILON};
pub use parser::{ParseError, Parser};
pub use plan::{build_resource_plan, PlanError, RenderMode, Selection, SortDirection, SqlQuery};

/// Parses `input` into a [`Query`]. A missing/empty input yields an empty
/// predicate tree; malformed input raises a [`ParseError`] (a user error).
pub fn parse_query(input: &str) -> Result<Query, ParseError> {
    Parser::parse(input)
}
