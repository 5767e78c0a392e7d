//! meshgate integration test harness.
//!
//! Every test runs a real gateway router over TCP against mock seed and
//! peer servers spawned in the same process. Mock peers bind to
//! 127.0.0.x and the gateway maps loopback addresses to 127.0.0.1, so
//! no network setup is needed.

mod streaming;

use std::convert::Infallible;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum::body::Body;
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;

use meshgate_api::ApiState;
use meshgate_core::GatewayConfig;
use meshgate_services::directory::PEERS_PATH;
use meshgate_services::ingest::STREAM_PATH;
use meshgate_services::EventHub;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Serve `app` on `ip:port` (port 0 = any) and return the bound port.
pub async fn serve_on(ip: &str, port: u16, app: Router) -> u16 {
    let listener = tokio::net::TcpListener::bind((ip, port))
        .await
        .expect("bind mock server");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

/// Seed node answering the peer-listing endpoint with `peers`.
pub async fn spawn_seed(peers: Value) -> String {
    let app = Router::new().route(
        PEERS_PATH,
        get(move || {
            let peers = peers.clone();
            async move { Json(peers) }
        }),
    );
    format!("http://127.0.0.1:{}", serve_on("127.0.0.1", 0, app).await)
}

/// A port nothing listens on.
pub fn dead_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Peer stream endpoint: sends `raw` once and keeps the connection open.
pub fn stream_route(raw: &'static str) -> Router {
    Router::new().route(
        STREAM_PATH,
        get(move || async move {
            let first = futures::stream::once(async move {
                Ok::<_, Infallible>(Bytes::from_static(raw.as_bytes()))
            });
            Body::from_stream(first.chain(futures::stream::pending()))
        }),
    )
}

pub struct Gateway {
    pub url: String,
    pub hub: EventHub,
}

/// Gateway wired to `seed_url`, reaching every peer on `peer_port`.
pub async fn spawn_gateway(seed_url: &str, peer_port: u16) -> Gateway {
    let mut config = GatewayConfig::default();
    config.network.seed_peer_url = seed_url.to_string();
    config.network.peer_api_port = peer_port;
    config.network.loopback_alias = "127.0.0.1".to_string();
    config.timing.request_timeout_ms = 300;
    config.hub.subscriber_queue = 16;

    let hub = EventHub::from_config(&config.hub);
    let state = ApiState::new(reqwest::Client::new(), hub.clone(), &config);
    let port = serve_on("127.0.0.1", 0, meshgate_api::router(state)).await;

    Gateway {
        url: format!("http://127.0.0.1:{}", port),
        hub,
    }
}

/// GET a gateway route and decode the JSON body.
pub async fn api_get(url: &str) -> Result<(reqwest::StatusCode, Value)> {
    let resp = reqwest::get(url).await.context("gateway unreachable")?;
    let status = resp.status();
    let body = resp.json().await.context("gateway sent non-JSON body")?;
    Ok((status, body))
}

/// Read the body until `until` holds for the text so far, or time out.
pub async fn read_until(
    resp: &mut reqwest::Response,
    until: impl Fn(&str) -> bool,
) -> Result<String> {
    let mut text = String::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !until(&text) {
        let chunk = tokio::time::timeout_at(deadline, resp.chunk())
            .await
            .context("timed out waiting for stream data")??;
        match chunk {
            Some(bytes) => text.push_str(&String::from_utf8_lossy(&bytes)),
            None => bail!("stream closed early; got {:?}", text),
        }
    }
    Ok(text)
}

/// JSON payloads of the complete `data:` lines in `text`.
pub fn data_frames(text: &str) -> Vec<Value> {
    text.lines()
        .filter_map(|l| l.strip_prefix("data:"))
        .filter_map(|p| serde_json::from_str(p.trim()).ok())
        .collect()
}

pub async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}
