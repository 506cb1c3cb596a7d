/// Executor (C6). Grounded in `original_source/karps/database/database.py`'s
/// `fetchall`/`run_paged_searches` for the round-trip shape, and in the
/// teacher's `TempoStorage::discover_blocks` for the async/await and
/// `tracing` instrumentation conventions (a function per logical step, spans
/// recorded around the slow I/O call).
use std::time::Instant;

use sqlx::{Column, MySqlPool, Row};
use tracing::{debug, warn};

use crate::error::Result;

/// One executed query's columns and rows, rows kept as loosely-typed strings
/// (MySQL's textual protocol renders `JSON`/`GROUP_CONCAT` results as text
/// regardless of declared type, and downstream decoding in `crate::decode`
/// expects strings to split/parse anyway).
#[derive(Debug, Clone, Default)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Executes `sql` against a freshly acquired connection from `pool`,
/// releasing it on return. Grounded in `database.py`'s `fetchall`, which
/// times the round trip and logs it regardless of success.
pub async fn fetch_all(pool: &MySqlPool, sql: &str) -> Result<QueryRows> {
    let start = Instant::now();
    let result = sqlx::query(sql).fetch_all(pool).await;
    let elapsed = start.elapsed();

    match &result {
        Ok(rows) => debug!(took_ms = elapsed.as_millis(), row_count = rows.len(), sql = %sql, "executed query"),
        Err(err) => warn!(took_ms = elapsed.as_millis(), sql = %sql, error = %err, "query failed"),
    }

    let rows = result?;
    let columns = rows
        .first()
        .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let decoded = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|i| row.try_get::<Option<String>, _>(i).unwrap_or(None))
                .collect()
        })
        .collect();

    Ok(QueryRows { columns, rows: decoded })
}

/// Runs a `COUNT(*)` plan and extracts the scalar count from its single row.
pub async fn fetch_count(pool: &MySqlPool, sql: &str) -> Result<i64> {
    let result = fetch_all(pool, sql).await?;
    let count = result
        .rows
        .first()
        .and_then(|row| row.first())
        .and_then(|v| v.as_deref())
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0);
    Ok(count)
}
