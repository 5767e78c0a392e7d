//! meshgated: meshgate cluster gateway daemon.

use anyhow::Result;

use meshgate_core::GatewayConfig;
use meshgate_services::{Discovery, EventHub};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = GatewayConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = GatewayConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        let mut config = GatewayConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    });
    tracing::info!(
        seed = %config.network.seed_peer_url,
        peer_port = config.network.peer_api_port,
        gateway_port = config.network.gateway_port,
        "meshgated starting"
    );

    // Shared state
    let http = reqwest::Client::new();
    let hub = EventHub::from_config(&config.hub);
    tracing::info!(
        capacity = hub.capacity(),
        subscriber_queue = config.hub.subscriber_queue,
        "event hub ready"
    );

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let discovery_task = tokio::spawn(Discovery::from_config(http.clone(), hub.clone(), &config).run());

    let api_task = {
        let state = meshgate_api::ApiState::new(http, hub, &config);
        let listen_addr = config.network.listen_addr.clone();
        let port = config.network.gateway_port;
        tokio::spawn(async move { meshgate_api::serve(state, &listen_addr, port).await })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("shutdown signal received"),
        r = discovery_task => tracing::error!("discovery task exited: {:?}", r),
        r = api_task => match r {
            // Failing to bind or serve is the one fatal error.
            Ok(Err(e)) => {
                tracing::error!(error = %e, "gateway server failed");
                return Err(e);
            }
            other => tracing::error!("gateway server exited: {:?}", other),
        },
    }

    Ok(())
}
