//! /peers: the seed directory's peer list, passed through.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use meshgate_core::Peer;

use super::ApiState;

pub async fn handle_peers(
    State(state): State<ApiState>,
) -> Result<Json<Vec<Peer>>, (StatusCode, String)> {
    state
        .aggregator
        .directory()
        .resolve_peers()
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!(error = %e, "peer directory unavailable");
            (StatusCode::BAD_GATEWAY, e.to_string())
        })
}
