//! /stream and /logs: live event relay.
//!
//! `/stream` without a selector replays the hub buffer oldest-first and
//! then follows the hub. `/stream?peer=<id-or-ip>` instead proxies the
//! named peer's own event stream byte for byte.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use meshgate_core::PeerEvent;
use meshgate_services::http::open_stream;
use meshgate_services::ingest::STREAM_PATH;
use meshgate_services::EventHub;

use super::ApiState;

// ── /logs ─────────────────────────────────────────────────────────────────────

/// Current hub buffer, newest first.
pub async fn handle_logs(State(state): State<ApiState>) -> Json<Vec<PeerEvent>> {
    Json(state.hub.snapshot())
}

// ── /stream ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StreamQuery {
    pub peer: Option<String>,
}

/// Headers the event-stream content type does not already imply.
const RELAY_HEADERS: [(header::HeaderName, &str); 2] = [
    (header::CONNECTION, "keep-alive"),
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
];

pub async fn handle_stream(
    State(state): State<ApiState>,
    Query(query): Query<StreamQuery>,
) -> Response {
    match query.peer.filter(|p| !p.trim().is_empty()) {
        None => aggregated_stream(&state.hub).into_response(),
        Some(selector) => match direct_relay(&state, selector.trim()).await {
            Ok(resp) => resp,
            Err(e) => e.into_response(),
        },
    }
}

/// Buffered history (oldest first) followed by live hub events.
///
/// The subscription lives inside the response stream, so it is released
/// as soon as the client goes away and axum drops the body.
pub fn aggregated_stream(hub: &EventHub) -> impl IntoResponse {
    let mut history = hub.snapshot();
    history.reverse();
    let subscription = hub.subscribe();
    tracing::debug!(
        subscriber = ?subscription.id(),
        replayed = history.len(),
        "aggregated stream opened"
    );

    let live = futures::stream::unfold(subscription, |mut sub| async move {
        sub.recv().await.map(|event| (event, sub))
    });

    (RELAY_HEADERS, Sse::new(frames(futures::stream::iter(history).chain(live))))
}

/// One `data: <json>` frame per event.
fn frames<S>(events: S) -> impl Stream<Item = Result<Event, Infallible>>
where
    S: Stream<Item = PeerEvent>,
{
    events.filter_map(|event| async move {
        match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(e) => {
                tracing::warn!(error = %e, peer = %event.peer_id, "dropping unencodable event");
                None
            }
        }
    })
}

/// Proxy one peer's event stream to the client without parsing it.
pub async fn direct_relay(state: &ApiState, selector: &str) -> Result<Response, (StatusCode, String)> {
    let url = relay_target(state, selector).await;
    let upstream = open_stream(&state.http, &url).await.map_err(|e| {
        tracing::warn!(peer = selector, error = %e, "relay upstream unavailable");
        (StatusCode::BAD_GATEWAY, e.to_string())
    })?;
    tracing::info!(peer = selector, url = %url, "relaying peer stream");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        RELAY_HEADERS,
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}

/// Match the selector against the directory (id first, then ip). Falls
/// back to using it as a host when the directory cannot help.
async fn relay_target(state: &ApiState, selector: &str) -> String {
    match state.aggregator.directory().resolve_peers().await {
        Ok(peers) => {
            let found = peers
                .iter()
                .find(|p| p.id == selector)
                .or_else(|| peers.iter().find(|p| p.ip == selector));
            if let Some(peer) = found {
                return state.addressing.url(peer, STREAM_PATH);
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "directory unavailable, relaying to selector as host");
        }
    }
    state.addressing.url_for_host(selector, STREAM_PATH)
}
