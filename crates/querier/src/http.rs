use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{routing, Json, Router};
use context::{AppContext, CountParams, SearchParams};
use serde::Deserialize;

use crate::access::AccessResolver;
use crate::error::HttpError;
use crate::normalize::{csv_list, parse_sort};

/// HTTP handler struct that holds the shared application context and the
/// access resolver. Grounded in the teacher's `HttpHandler{router()}` shape.
#[derive(Clone)]
pub struct HttpHandler {
    ctx: AppContext,
    access: Arc<dyn AccessResolver>,
}

impl HttpHandler {
    pub fn new(ctx: AppContext, access: Arc<dyn AccessResolver>) -> Self {
        Self { ctx, access }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/config", routing::get(Self::config_handler))
            .route("/search", routing::get(Self::search_handler))
            .route("/count", routing::get(Self::count_handler))
            .with_state(self)
    }

    /// `GET /config` — every installed resource plus the shared field
    /// catalogue and the set of observed tags.
    async fn config_handler(State(handler): State<Self>) -> Response {
        let response = schema::ConfigResponse::new((*handler.ctx.resources).clone(), (*handler.ctx.catalogue).clone());
        Json(response).into_response()
    }

    /// `GET /search` — see spec §6's endpoint table: `resources` (CSV,
    /// non-empty), `q` (opt), `size` (default 10), `from` (default 0), `sort`.
    async fn search_handler(
        State(handler): State<Self>,
        Query(raw): Query<RawSearchParams>,
        headers: HeaderMap,
    ) -> Result<Response, HttpError> {
        let allowed = handler.resolve_allowed(&headers);
        let sort = parse_sort(raw.sort.as_deref().unwrap_or(""))
            .map_err(|e| HttpError { message: e, code: None, details: None })?;

        let params = SearchParams {
            query: raw.q.unwrap_or_default(),
            resources: Some(csv_list(&raw.resources)),
            fields: raw.fields.as_deref().map(csv_list),
            sort,
            from: raw.from.unwrap_or(0),
            size: raw.size.unwrap_or(10),
            allowed_resources: allowed,
        };

        let result = context::search::search(&handler.ctx, params).await?;
        Ok(Json(result).into_response())
    }

    /// `GET /count` — `resources`, `q` (opt), `compile` (CSV), `columns`
    /// (`lhs=rhs`, default `resourceId=_count`), `sort`.
    async fn count_handler(
        State(handler): State<Self>,
        Query(raw): Query<RawCountParams>,
        headers: HeaderMap,
    ) -> Result<Response, HttpError> {
        let allowed = handler.resolve_allowed(&headers);
        let sort = parse_sort(raw.sort.as_deref().unwrap_or(""))
            .map_err(|e| HttpError { message: e, code: None, details: None })?;
        let columns_raw = normalize_columns(raw.columns.as_deref().unwrap_or("resourceId=_count"));

        let params = CountParams {
            query: raw.q.unwrap_or_default(),
            resources: Some(csv_list(&raw.resources)),
            compile: csv_list(&raw.compile),
            columns_raw,
            sort,
            allowed_resources: allowed,
        };

        let result = context::count::count(&handler.ctx, params).await?;
        Ok(Json(result).into_response())
    }

    fn resolve_allowed(&self, headers: &HeaderMap) -> std::collections::HashSet<String> {
        self.access
            .resolve(headers)
            .unwrap_or_else(|| self.ctx.resources.iter().map(|r| r.resource_id.clone()).collect())
    }
}

/// Normalises the `lhs=rhs` pair's left-hand side only; the right-hand side
/// is either `_count` or a user-defined field name, never one of the two
/// legacy camelCase aliases by itself (`entryWord`/`resourceId` already cover
/// the only virtual fields that can appear there).
fn normalize_columns(raw: &str) -> String {
    match raw.split_once('=') {
        Some((lhs, rhs)) => format!("{}={}", crate::normalize::normalize_field(lhs.trim()), rhs.trim()),
        None => raw.to_string(),
    }
}

#[derive(Debug, Deserialize)]
pub struct RawSearchParams {
    pub resources: String,
    pub q: Option<String>,
    pub fields: Option<String>,
    pub size: Option<i64>,
    pub from: Option<i64>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawCountParams {
    pub resources: String,
    pub q: Option<String>,
    pub compile: String,
    pub columns: Option<String>,
    pub sort: Option<String>,
}
