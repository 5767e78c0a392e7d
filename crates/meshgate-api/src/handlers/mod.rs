//! HTTP API handlers: gateway views over the cluster.

pub mod aggregate;
pub mod peers;
pub mod stream;

use meshgate_core::GatewayConfig;
use meshgate_services::{Aggregator, EventHub, PeerAddressing};

#[derive(Clone)]
pub struct ApiState {
    pub aggregator: Aggregator,
    pub hub: EventHub,
    /// Client for long-lived relay connections.
    pub http: reqwest::Client,
    pub addressing: PeerAddressing,
}

impl ApiState {
    pub fn new(http: reqwest::Client, hub: EventHub, config: &GatewayConfig) -> Self {
        Self {
            aggregator: Aggregator::from_config(http.clone(), config),
            hub,
            http,
            addressing: PeerAddressing::from_config(config),
        }
    }
}

// Re-export handler functions for use in router setup.
pub use aggregate::{handle_aggregate, handle_health, handle_stats};
pub use peers::handle_peers;
pub use stream::{handle_logs, handle_stream};
