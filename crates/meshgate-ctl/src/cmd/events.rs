//! Aggregated reads: arbitrary paths, stats, health and the buffered log.

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use super::http::{base_url, get_json};

#[derive(Deserialize)]
struct PeerEvent {
    #[serde(rename = "peerId")]
    peer_id: String,
    #[serde(rename = "peerIp")]
    peer_ip: String,
    #[serde(rename = "contenido")]
    content: Value,
}

pub async fn cmd_aggregate(port: u16, path: &str) -> Result<()> {
    let url = reqwest::Url::parse_with_params(
        &format!("{}/aggregate", base_url(port)),
        &[("path", path)],
    )?;
    let events: Vec<PeerEvent> = get_json(url.as_str()).await?;
    print_events(&format!("Aggregate {}", path), &events);
    Ok(())
}

pub async fn cmd_named(port: u16, name: &str) -> Result<()> {
    let events: Vec<PeerEvent> = get_json(&format!("{}/{}", base_url(port), name)).await?;
    print_events(name, &events);
    Ok(())
}

fn print_events(title: &str, events: &[PeerEvent]) {
    println!("═══════════════════════════════════════");
    println!("  {} ({} entries)", title, events.len());
    println!("═══════════════════════════════════════");

    if events.is_empty() {
        println!("  No peer answered.");
        return;
    }

    for e in events {
        println!("  {} ({}) {}", e.peer_id, e.peer_ip, e.content);
    }
}
