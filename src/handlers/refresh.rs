use crate::error::Result;
use crate::lifecycle::RebuildReport;
use crate::state::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /refresh - Rebuild the index from the registry.
///
/// Runs the whole fetch inline; the previous index keeps serving searches
/// until the new one is swapped in.
pub async fn refresh_handler(State(state): State<Arc<AppState>>) -> Result<Json<RebuildReport>> {
    let report = state.rebuild().await?;
    Ok(Json(report))
}
