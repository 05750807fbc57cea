//! Free-text search over the catalog index.

use crate::error::{AppError, Result};
use crate::ingestion::CatalogEntity;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Free text; every token must prefix-match a token of a server's name or description
    pub query: String,
    /// Maximum results. Omitted uses the configured default, non-positive uses the index default
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<CatalogEntity>,
    pub total: usize,
}

/// POST /search - Find registry servers matching a query.
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let start_time = std::time::Instant::now();

    if request.query.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Query cannot be empty".to_string(),
        ));
    }

    let limit = match request.limit {
        None => state.config.default_limit,
        Some(limit) => usize::try_from(limit).unwrap_or(0),
    };

    let results = state.query(&request.query, limit).await;
    let total = results.len();

    let elapsed = start_time.elapsed();
    tracing::info!(
        query = %request.query,
        limit,
        total,
        elapsed_us = elapsed.as_micros() as u64,
        "Search completed"
    );

    metrics::counter!("search_requests_total").increment(1);
    metrics::histogram!("search_latency_ms").record(elapsed.as_secs_f64() * 1000.0);

    Ok(Json(SearchResponse { results, total }))
}
