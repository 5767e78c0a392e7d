//! Aggregated peer events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::peer::Peer;

/// One unit of peer-originated data, tagged with its source.
///
/// `content` is whatever JSON the peer produced; the gateway stores and
/// forwards it without looking inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerEvent {
    #[serde(rename = "peerId")]
    pub peer_id: String,
    #[serde(rename = "peerIp")]
    pub peer_ip: String,
    #[serde(rename = "contenido", alias = "content")]
    pub content: Value,
}

impl PeerEvent {
    pub fn from_peer(peer: &Peer, content: Value) -> Self {
        Self {
            peer_id: peer.id.clone(),
            peer_ip: peer.ip.clone(),
            content,
        }
    }

    /// Split a peer response body into events.
    ///
    /// A top-level array yields one event per element, in order; any
    /// other value yields a single event.
    pub fn expand(peer: &Peer, body: Value) -> Vec<Self> {
        match body {
            Value::Array(items) => items
                .into_iter()
                .map(|item| Self::from_peer(peer, item))
                .collect(),
            other => vec![Self::from_peer(peer, other)],
        }
    }
}
