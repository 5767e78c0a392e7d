use crate::*;

use axum::http::StatusCode;
use meshgate_core::PeerEvent;
use serde_json::json;

fn event(n: u64) -> PeerEvent {
    PeerEvent {
        peer_id: "p1".into(),
        peer_ip: "10.0.0.2".into(),
        content: json!({ "n": n }),
    }
}

fn numbers(frames: &[Value]) -> Vec<u64> {
    frames
        .iter()
        .map(|f| f["contenido"]["n"].as_u64().unwrap())
        .collect()
}

/// History comes out oldest first, then live events follow in order.
#[tokio::test]
async fn test_aggregated_stream_replays_then_follows() {
    let seed = spawn_seed(json!([])).await;
    let gw = spawn_gateway(&seed, dead_port()).await;
    for n in 1..=3 {
        gw.hub.publish(event(n));
    }

    let mut resp = reqwest::get(format!("{}/stream", gw.url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let header = |name: &str| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    assert_eq!(header("content-type").as_deref(), Some("text/event-stream"));
    assert_eq!(header("cache-control").as_deref(), Some("no-cache"));
    assert_eq!(header("access-control-allow-origin").as_deref(), Some("*"));

    let text = read_until(&mut resp, |t| data_frames(t).len() >= 3).await.unwrap();
    assert_eq!(numbers(&data_frames(&text)), vec![1, 2, 3]);

    assert!(wait_until(|| gw.hub.subscriber_count() == 1).await);
    gw.hub.publish(event(4));
    gw.hub.publish(event(5));

    let text = read_until(&mut resp, |t| data_frames(t).len() >= 2).await.unwrap();
    assert_eq!(numbers(&data_frames(&text)), vec![4, 5]);

    let first = &data_frames(&text)[0];
    assert_eq!(first["peerId"], "p1");
    assert_eq!(first["peerIp"], "10.0.0.2");
}

#[tokio::test]
async fn test_client_disconnect_unsubscribes() {
    let seed = spawn_seed(json!([])).await;
    let gw = spawn_gateway(&seed, dead_port()).await;

    let resp = reqwest::get(format!("{}/stream", gw.url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(wait_until(|| gw.hub.subscriber_count() == 1).await);

    drop(resp);

    // Publishing forces a write, so the server notices the closed socket
    // even if it has not polled it yet.
    let hub = gw.hub.clone();
    let mut n = 0;
    let released = wait_until(|| {
        n += 1;
        hub.publish(event(n));
        hub.subscriber_count() == 0
    })
    .await;
    assert!(released, "subscription leaked after disconnect");
}

#[tokio::test]
async fn test_logs_snapshot_is_newest_first() {
    let seed = spawn_seed(json!([])).await;
    let gw = spawn_gateway(&seed, dead_port()).await;
    for n in 1..=3 {
        gw.hub.publish(event(n));
    }

    let (status, body) = api_get(&format!("{}/logs", gw.url)).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let frames = body.as_array().unwrap().clone();
    assert_eq!(numbers(&frames), vec![3, 2, 1]);
}

/// Raw bytes, comments included, go through untouched.
#[tokio::test]
async fn test_direct_relay_by_peer_id() {
    const RAW: &str = ": hello\n\ndata: {\"x\":1}\n\n";
    let peer_port = serve_on("127.0.0.1", 0, stream_route(RAW)).await;
    let seed = spawn_seed(json!([{"id": "p1", "ip": "localhost", "estado": "ONLINE"}])).await;
    let gw = spawn_gateway(&seed, peer_port).await;

    let mut resp = reqwest::get(format!("{}/stream?peer=p1", gw.url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );

    let text = read_until(&mut resp, |t| t.len() >= RAW.len()).await.unwrap();
    assert_eq!(text, RAW);
    // Relay mode never touches the hub.
    assert_eq!(gw.hub.subscriber_count(), 0);
}

#[tokio::test]
async fn test_direct_relay_by_ip_without_directory() {
    const RAW: &str = "data: {\"y\":2}\n\n";
    let peer_port = serve_on("127.0.0.1", 0, stream_route(RAW)).await;
    let seed = format!("http://127.0.0.1:{}", dead_port());
    let gw = spawn_gateway(&seed, peer_port).await;

    let mut resp = reqwest::get(format!("{}/stream?peer=127.0.0.1", gw.url))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = read_until(&mut resp, |t| t.len() >= RAW.len()).await.unwrap();
    assert_eq!(data_frames(&text), vec![json!({"y": 2})]);
}

#[tokio::test]
async fn test_direct_relay_to_unreachable_peer_is_bad_gateway() {
    let seed = spawn_seed(json!([{"id": "p1", "ip": "127.0.0.1", "estado": "ONLINE"}])).await;
    let gw = spawn_gateway(&seed, dead_port()).await;

    let resp = reqwest::get(format!("{}/stream?peer=p1", gw.url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_direct_relay_to_refusing_peer_is_bad_gateway() {
    let app = Router::new().route(
        STREAM_PATH,
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let peer_port = serve_on("127.0.0.1", 0, app).await;
    let seed = spawn_seed(json!([{"id": "p1", "ip": "127.0.0.1", "estado": "ONLINE"}])).await;
    let gw = spawn_gateway(&seed, peer_port).await;

    let resp = reqwest::get(format!("{}/stream?peer=p1", gw.url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = resp.text().await.unwrap();
    assert!(body.contains("500"), "unexpected body: {body}");
}

/// Discovery feeds the hub, and hub events reach a streaming client.
#[tokio::test]
async fn test_discovery_to_stream_pipeline() {
    let peer_port = serve_on(
        "127.0.0.1",
        0,
        stream_route("data: {\"msg\":\"from-peer\"}\n\n"),
    )
    .await;
    let seed = spawn_seed(json!([{"id": "p1", "ip": "127.0.0.1", "estado": "ONLINE"}])).await;
    let gw = spawn_gateway(&seed, peer_port).await;

    let mut resp = reqwest::get(format!("{}/stream", gw.url)).await.unwrap();
    assert!(wait_until(|| gw.hub.subscriber_count() == 1).await);

    let mut config = GatewayConfig::default();
    config.network.seed_peer_url = seed.clone();
    config.network.peer_api_port = peer_port;
    config.network.loopback_alias = "127.0.0.1".to_string();
    let mut discovery =
        meshgate_services::Discovery::from_config(reqwest::Client::new(), gw.hub.clone(), &config);
    assert_eq!(discovery.run_cycle().await, 1);

    let text = read_until(&mut resp, |t| !data_frames(t).is_empty()).await.unwrap();
    assert_eq!(
        data_frames(&text),
        vec![json!({"peerId": "p1", "peerIp": "127.0.0.1", "contenido": {"msg": "from-peer"}})]
    );
}
