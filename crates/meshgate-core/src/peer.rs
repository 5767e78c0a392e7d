//! Peer records as published by the seed directory.
//!
//! The gateway never owns peers. Every discovery cycle and every
//! aggregation call re-reads the directory, so a `Peer` is only ever a
//! short-lived copy of what the seed reported.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Host names that only make sense inside the peer's own network namespace.
const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "::1"];

/// Liveness as reported by the directory.
///
/// Unknown values are kept verbatim so `/peers` passes them through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PeerStatus {
    Online,
    #[default]
    Offline,
    Other(String),
}

impl From<String> for PeerStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ONLINE" => PeerStatus::Online,
            "OFFLINE" => PeerStatus::Offline,
            _ => PeerStatus::Other(s),
        }
    }
}

impl From<PeerStatus> for String {
    fn from(s: PeerStatus) -> Self {
        match s {
            PeerStatus::Online => "ONLINE".to_string(),
            PeerStatus::Offline => "OFFLINE".to_string(),
            PeerStatus::Other(s) => s,
        }
    }
}

/// A cluster node listed by the seed directory. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub ip: String,

    /// Port the peer advertises for p2p traffic.
    #[serde(default, rename = "puerto", alias = "port", deserialize_with = "null_as_default")]
    pub port: u16,

    /// Port of the peer's client-facing server, 0 when not reported.
    #[serde(
        default,
        rename = "puertoServidor",
        alias = "serverPort",
        deserialize_with = "null_as_default"
    )]
    pub server_port: u16,

    #[serde(default, rename = "estado", alias = "status", deserialize_with = "null_as_default")]
    pub status: PeerStatus,

    /// Any other fields the directory sends, kept for passthrough.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Directories send `null` for fields they have no value for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Peer {
    pub fn is_online(&self) -> bool {
        self.status == PeerStatus::Online
    }

    /// Full URL for `path` on this peer's API.
    pub fn endpoint(&self, loopback_alias: &str, api_port: u16, path: &str) -> String {
        peer_url(&self.ip, loopback_alias, api_port, path)
    }
}

/// Rewrite loopback addresses to `loopback_alias`.
///
/// A peer advertising `127.0.0.1` means "this host" from its own point of
/// view; a gateway in a separate namespace reaches it through the alias.
pub fn resolved_host<'a>(ip: &'a str, loopback_alias: &'a str) -> &'a str {
    if LOOPBACK_HOSTS.contains(&ip) {
        loopback_alias
    } else {
        ip
    }
}

/// `http://{host}:{port}{path}` with the loopback rewrite applied.
pub fn peer_url(ip: &str, loopback_alias: &str, api_port: u16, path: &str) -> String {
    let host = resolved_host(ip, loopback_alias);
    if host.contains(':') && !host.starts_with('[') {
        format!("http://[{}]:{}{}", host, api_port, path)
    } else {
        format!("http://{}:{}{}", host, api_port, path)
    }
}
