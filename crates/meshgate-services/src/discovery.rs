//! Discovery loop: keeps one ingestion connection open per online peer.
//!
//! Every interval the directory is re-read. Each online peer without a
//! live connection gets one; a connection that drops is not retried on
//! the spot but picked up again on the next cycle if the peer is still
//! online.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::task::JoinSet;

use meshgate_core::GatewayConfig;

use crate::directory::DirectoryClient;
use crate::http::PeerAddressing;
use crate::hub::EventHub;
use crate::ingest::{ingest_peer, STREAM_PATH};

/// Peer ids with an open ingestion connection.
#[derive(Clone, Default)]
pub struct ActiveConnections {
    peers: Arc<DashSet<String>>,
}

impl ActiveConnections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `peer_id` active unless it already is.
    ///
    /// Check and insert are a single atomic step, so two callers can never
    /// both win for the same peer.
    pub fn try_acquire(&self, peer_id: &str) -> Option<ActiveGuard> {
        self.peers.insert(peer_id.to_string()).then(|| ActiveGuard {
            set: self.clone(),
            peer_id: peer_id.to_string(),
        })
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.peers.contains(peer_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.peers.iter().map(|id| id.key().clone()).collect()
    }
}

/// Removes its peer from the active set when dropped.
pub struct ActiveGuard {
    set: ActiveConnections,
    peer_id: String,
}

impl ActiveGuard {
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.set.peers.remove(&self.peer_id);
    }
}

/// Owns the ingestion tasks it starts; dropping it aborts them.
pub struct Discovery {
    directory: DirectoryClient,
    hub: EventHub,
    http: reqwest::Client,
    addressing: PeerAddressing,
    interval: Duration,
    active: ActiveConnections,
    connections: JoinSet<()>,
}

impl Discovery {
    pub fn new(
        directory: DirectoryClient,
        hub: EventHub,
        http: reqwest::Client,
        addressing: PeerAddressing,
        interval: Duration,
    ) -> Self {
        Self {
            directory,
            hub,
            http,
            addressing,
            interval,
            active: ActiveConnections::new(),
            connections: JoinSet::new(),
        }
    }

    pub fn from_config(http: reqwest::Client, hub: EventHub, config: &GatewayConfig) -> Self {
        Self::new(
            DirectoryClient::from_config(http.clone(), config),
            hub,
            http,
            PeerAddressing::from_config(config),
            config.timing.discovery_interval(),
        )
    }

    pub fn active(&self) -> &ActiveConnections {
        &self.active
    }

    /// One discovery pass. Returns how many new connections were started.
    pub async fn run_cycle(&mut self) -> usize {
        let peers = match self.directory.resolve_peers().await {
            Ok(peers) => peers,
            Err(e) => {
                tracing::warn!(error = %e, "peer discovery failed");
                return 0;
            }
        };

        let mut started = 0;
        for peer in peers.into_iter().filter(|p| p.is_online()) {
            let Some(guard) = self.active.try_acquire(&peer.id) else {
                continue;
            };
            let url = self.addressing.url(&peer, STREAM_PATH);
            self.connections.spawn(ingest_peer(
                self.http.clone(),
                url,
                peer,
                self.hub.clone(),
                guard,
            ));
            started += 1;
        }

        tracing::debug!(started, active = self.active.len(), "discovery cycle complete");
        started
    }

    /// Run discovery for the life of the process.
    pub async fn run(mut self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "peer discovery starting");
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_cycle().await;
                }
                Some(joined) = self.connections.join_next(), if !self.connections.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "ingestion task exited abnormally");
                    }
                }
            }
        }
    }
}
