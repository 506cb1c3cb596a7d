use std::collections::HashSet;

use query::plan::SortDirection;

/// Already-parsed `GET /search` parameters. Field-name normalization
/// (`entryWord`/`resourceId` <-> snake_case) and raw query-string parsing
/// happen in `querier`; by the time a request reaches `context` everything
/// is plain snake_case.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub resources: Option<Vec<String>>,
    pub fields: Option<Vec<String>>,
    pub sort: Vec<(String, SortDirection)>,
    pub from: i64,
    pub size: i64,
    pub allowed_resources: HashSet<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            resources: None,
            fields: None,
            sort: Vec::new(),
            from: 0,
            size: 25,
            allowed_resources: HashSet::new(),
        }
    }
}

/// Already-parsed `GET /count` parameters.
#[derive(Debug, Clone)]
pub struct CountParams {
    pub query: String,
    pub resources: Option<Vec<String>>,
    pub compile: Vec<String>,
    pub columns_raw: String,
    pub sort: Vec<(String, SortDirection)>,
    pub allowed_resources: HashSet<String>,
}
