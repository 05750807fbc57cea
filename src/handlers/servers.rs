use crate::ingestion::CatalogEntity;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ServersResponse {
    pub count: usize,
    pub servers: Vec<CatalogEntity>,
}

/// GET /servers - Every indexed server, sorted by name.
pub async fn servers_handler(State(state): State<Arc<AppState>>) -> Json<ServersResponse> {
    let mut servers = state.get_all().await;
    servers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id().cmp(b.id())));

    Json(ServersResponse {
        count: servers.len(),
        servers,
    })
}
