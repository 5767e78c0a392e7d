//! /aggregate, /stats, /health handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use meshgate_core::PeerEvent;

use super::ApiState;

// ── /aggregate ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AggregateQuery {
    /// Path queried on every peer, e.g. `/api/logs/stats`.
    pub path: String,
}

pub async fn handle_aggregate(
    State(state): State<ApiState>,
    Query(query): Query<AggregateQuery>,
) -> Json<Vec<PeerEvent>> {
    let path = normalize_path(&query.path);
    Json(state.aggregator.aggregate(&path).await)
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

// ── /stats, /health ───────────────────────────────────────────────────────────

pub async fn handle_stats(State(state): State<ApiState>) -> Json<Vec<PeerEvent>> {
    Json(state.aggregator.aggregate("/api/logs/stats").await)
}

pub async fn handle_health(State(state): State<ApiState>) -> Json<Vec<PeerEvent>> {
    Json(state.aggregator.aggregate("/api/logs/health").await)
}
