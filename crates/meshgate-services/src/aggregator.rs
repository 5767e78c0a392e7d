//! Fan-out aggregator: one GET per online peer, merged.
//!
//! Partial failure is the normal case. A peer that times out, answers
//! with a non-200 or sends garbage is logged and left out; the caller
//! always gets whatever the rest of the cluster produced.

use std::time::Duration;

use tokio::task::JoinSet;

use meshgate_core::{GatewayConfig, Peer, PeerEvent};

use crate::directory::DirectoryClient;
use crate::error::PeerError;
use crate::http::{get_json, PeerAddressing};

#[derive(Debug, Clone)]
pub struct Aggregator {
    directory: DirectoryClient,
    http: reqwest::Client,
    addressing: PeerAddressing,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(
        directory: DirectoryClient,
        http: reqwest::Client,
        addressing: PeerAddressing,
        timeout: Duration,
    ) -> Self {
        Self {
            directory,
            http,
            addressing,
            timeout,
        }
    }

    pub fn from_config(http: reqwest::Client, config: &GatewayConfig) -> Self {
        Self::new(
            DirectoryClient::from_config(http.clone(), config),
            http,
            PeerAddressing::from_config(config),
            config.timing.request_timeout(),
        )
    }

    pub fn directory(&self) -> &DirectoryClient {
        &self.directory
    }

    /// Query `path` on every online peer and concatenate the results.
    ///
    /// Waits for every peer call to finish or fail. Results come back in
    /// peer-completion order; items from one peer keep their own order.
    pub async fn aggregate(&self, path: &str) -> Vec<PeerEvent> {
        let peers = self.directory.resolve_online().await;
        tracing::info!(peers = peers.len(), path, "aggregating");

        let mut calls = JoinSet::new();
        for peer in peers {
            let this = self.clone();
            let path = path.to_string();
            calls.spawn(async move {
                let result = this.fetch_peer(&peer, &path).await;
                (peer, result)
            });
        }

        let mut events = Vec::new();
        while let Some(joined) = calls.join_next().await {
            match joined {
                Ok((peer, Ok(batch))) => {
                    tracing::debug!(peer = %peer.id, ip = %peer.ip, entries = batch.len(), "peer answered");
                    events.extend(batch);
                }
                Ok((peer, Err(e))) => {
                    tracing::warn!(peer = %peer.id, url = e.url(), error = %e, "peer fetch failed");
                }
                Err(e) => tracing::warn!(error = %e, "peer fetch task aborted"),
            }
        }
        events
    }

    /// GET `path` from a single peer and expand the body into events.
    pub async fn fetch_peer(&self, peer: &Peer, path: &str) -> Result<Vec<PeerEvent>, PeerError> {
        let url = self.addressing.url(peer, path);
        tracing::trace!(peer = %peer.id, url = %url, "querying peer");
        let body: serde_json::Value = get_json(&self.http, &url, self.timeout).await?;
        Ok(PeerEvent::expand(peer, body))
    }
}
