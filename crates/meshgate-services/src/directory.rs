//! Peer directory client: asks the seed node who is in the cluster.
//!
//! No caching and no retries: each call is a fresh remote lookup, and
//! the retry cadence belongs to the caller (the discovery interval, or
//! the next client request).

use std::time::Duration;

use meshgate_core::{GatewayConfig, Peer};

use crate::error::PeerError;
use crate::http::get_json;

/// Peer-listing endpoint on the seed node.
pub const PEERS_PATH: &str = "/api/network/peers";

#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    seed_url: String,
    timeout: Duration,
}

impl DirectoryClient {
    pub fn new(http: reqwest::Client, seed_url: impl Into<String>, timeout: Duration) -> Self {
        let seed_url = seed_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            seed_url,
            timeout,
        }
    }

    pub fn from_config(http: reqwest::Client, config: &GatewayConfig) -> Self {
        Self::new(
            http,
            config.network.seed_peer_url.clone(),
            config.timing.request_timeout(),
        )
    }

    pub fn peers_url(&self) -> String {
        format!("{}{}", self.seed_url, PEERS_PATH)
    }

    /// Fetch the current peer list from the seed.
    pub async fn resolve_peers(&self) -> Result<Vec<Peer>, PeerError> {
        let url = self.peers_url();
        let peers: Vec<Peer> = get_json(&self.http, &url, self.timeout).await?;
        tracing::debug!(count = peers.len(), "peer directory resolved");
        Ok(peers)
    }

    /// Online peers only; an unusable directory counts as an empty cluster.
    pub async fn resolve_online(&self) -> Vec<Peer> {
        match self.resolve_peers().await {
            Ok(peers) => peers.into_iter().filter(Peer::is_online).collect(),
            Err(e) => {
                tracing::warn!(url = e.url(), error = %e, "peer directory unavailable, treating cluster as empty");
                Vec::new()
            }
        }
    }
}
