//! History listing and clearing.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;

use mathdesk_common::HistoryEntry;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
}

/// GET /history - every recorded entry, oldest first
pub async fn list_history(State(state): State<SharedState>) -> Json<Vec<HistoryEntry>> {
    Json(state.history.entries().await)
}

/// POST /clear_history - drop all entries
pub async fn clear_history(State(state): State<SharedState>) -> Json<ClearResponse> {
    let removed = state.history.clear().await;
    info!(removed, "History cleared");
    Json(ClearResponse { status: "History cleared" })
}
