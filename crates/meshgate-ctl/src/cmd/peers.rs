//! Peer directory listing.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json};

#[derive(Deserialize)]
struct PeerInfo {
    id: String,
    #[serde(default)]
    ip: String,
    #[serde(default, rename = "puerto")]
    port: u16,
    #[serde(default, rename = "puertoServidor")]
    server_port: u16,
    #[serde(default, rename = "estado")]
    status: String,
}

pub async fn cmd_peers(port: u16) -> Result<()> {
    let peers: Vec<PeerInfo> = get_json(&format!("{}/peers", base_url(port))).await?;

    if peers.is_empty() {
        println!("The seed directory lists no peers.");
        return Ok(());
    }

    let online = peers.iter().filter(|p| p.status == "ONLINE").count();

    println!("═══════════════════════════════════════");
    println!("  Cluster Peers ({} listed, {} online)", peers.len(), online);
    println!("═══════════════════════════════════════");

    for p in &peers {
        println!("  ┌─ {}", p.id);
        println!("  │  ip          : {}", p.ip);
        println!("  │  port        : {}", p.port);
        println!("  │  server port : {}", p.server_port);
        println!("  └─ status      : {}", p.status);
    }

    Ok(())
}
