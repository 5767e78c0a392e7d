//! Shared outbound HTTP helpers.

use std::time::Duration;

use serde::de::DeserializeOwned;

use meshgate_core::peer::{peer_url, Peer};
use meshgate_core::GatewayConfig;

use crate::error::PeerError;

/// How the gateway addresses peers: a single API port for every peer plus
/// the host that stands in for loopback addresses.
#[derive(Debug, Clone)]
pub struct PeerAddressing {
    pub loopback_alias: String,
    pub api_port: u16,
}

impl PeerAddressing {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            loopback_alias: config.network.loopback_alias.clone(),
            api_port: config.network.peer_api_port,
        }
    }

    pub fn url(&self, peer: &Peer, path: &str) -> String {
        peer.endpoint(&self.loopback_alias, self.api_port, path)
    }

    /// Same as [`url`](Self::url) for a bare host taken from a client request.
    pub fn url_for_host(&self, host: &str, path: &str) -> String {
        peer_url(host, &self.loopback_alias, self.api_port, path)
    }
}

/// Bounded GET decoding a JSON body.
pub async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<T, PeerError> {
    let resp = http
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|source| PeerError::Unreachable {
            url: url.to_string(),
            source,
        })?;

    if !resp.status().is_success() {
        return Err(PeerError::BadStatus {
            url: url.to_string(),
            status: resp.status(),
        });
    }

    resp.json::<T>().await.map_err(|source| PeerError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Open a long-lived streaming GET. No timeout: liveness is detected by
/// read errors on the body.
pub async fn open_stream(http: &reqwest::Client, url: &str) -> Result<reqwest::Response, PeerError> {
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|source| PeerError::Unreachable {
            url: url.to_string(),
            source,
        })?;

    if !resp.status().is_success() {
        return Err(PeerError::BadStatus {
            url: url.to_string(),
            status: resp.status(),
        });
    }
    Ok(resp)
}
