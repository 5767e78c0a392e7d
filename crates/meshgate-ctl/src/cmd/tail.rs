//! Follow the gateway event stream.

use anyhow::{Context, Result, bail};
use bytes::{Buf, BytesMut};
use futures::StreamExt;

use super::http::base_url;

/// Print stream payloads until the gateway closes the connection.
pub async fn cmd_tail(port: u16, peer: Option<&str>) -> Result<()> {
    let mut url = reqwest::Url::parse(&format!("{}/stream", base_url(port)))?;
    if let Some(peer) = peer {
        url.query_pairs_mut().append_pair("peer", peer);
    }

    let resp = reqwest::get(url.clone())
        .await
        .with_context(|| format!("failed to connect to meshgated at {} (is it running?)", url))?;
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("stream refused ({}): {}", status, body);
    }

    let mut body = resp.bytes_stream();
    let mut pending = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.context("stream interrupted")?;
        pending.extend_from_slice(&chunk);
        for payload in drain_payloads(&mut pending) {
            println!("{}", payload);
        }
    }

    println!("Stream closed.");
    Ok(())
}

/// Take every complete line off `pending` and return the `data:` payloads.
/// Bytes are only decoded once a whole line is in, so a character split
/// across chunks survives.
fn drain_payloads(pending: &mut BytesMut) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
        let line = pending.split_to(pos);
        pending.advance(1);
        let line = String::from_utf8_lossy(&line);
        if let Some(payload) = line.trim_end().strip_prefix("data:") {
            payloads.push(payload.trim().to_string());
        }
    }
    payloads
}
