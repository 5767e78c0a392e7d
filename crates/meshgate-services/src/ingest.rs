//! Per-peer ingestion: follows one peer's event stream into the hub.
//!
//! The peer serves `data: <json>` lines. Each parseable payload becomes a
//! [`PeerEvent`] tagged with that peer. Any other line (comments, `event:`
//! fields, blank separators) is skipped, as are payloads that are not JSON.

use bytes::{Buf, BytesMut};
use futures::StreamExt;

use meshgate_core::{Peer, PeerEvent};

use crate::discovery::ActiveGuard;
use crate::error::PeerError;
use crate::http::open_stream;
use crate::hub::EventHub;

/// Event-stream endpoint every peer exposes.
pub const STREAM_PATH: &str = "/api/logs/stream";

/// Prefix of a payload-carrying line.
pub const DATA_PREFIX: &str = "data:";

/// Payload of a `data:` line, if it is one and holds valid JSON.
pub fn parse_data_line(line: &str) -> Option<serde_json::Value> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    serde_json::from_str(payload.trim()).ok()
}

/// Longest line a peer may send before its connection is dropped.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Splits a byte stream into lines without assuming chunk boundaries
/// line up with newlines.
#[derive(Default)]
struct LineBuffer {
    buf: BytesMut,
    /// Bytes of `buf` already known to hold no newline.
    scanned: usize,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<String> {
        let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') else {
            self.scanned = self.buf.len();
            return None;
        };
        let line = self.buf.split_to(self.scanned + offset);
        self.buf.advance(1);
        self.scanned = 0;
        Some(decode_line(&line))
    }

    /// True once the unterminated tail is longer than any line may be.
    fn overflowed(&self) -> bool {
        self.buf.len() > MAX_LINE_BYTES
    }

    /// Whatever is left once the stream has ended.
    fn finish(self) -> Option<String> {
        (!self.buf.is_empty()).then(|| decode_line(&self.buf))
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Run one ingestion connection to completion.
///
/// Holds `guard` for its whole life so the peer stays marked active until
/// the connection is gone, whatever the reason it ended.
pub async fn ingest_peer(
    http: reqwest::Client,
    url: String,
    peer: Peer,
    hub: EventHub,
    guard: ActiveGuard,
) {
    tracing::info!(peer = %peer.id, url = %url, "connecting to peer event stream");
    match stream_events(&http, &url, &peer, &hub).await {
        Ok(published) => {
            tracing::info!(peer = %peer.id, published, "peer event stream ended");
        }
        Err(e) => {
            tracing::warn!(peer = %peer.id, url = e.url(), error = %e, "peer event stream failed");
        }
    }
    drop(guard);
    tracing::info!(peer = %peer.id, "disconnected from peer");
}

/// Publish every event read from `url` until the stream ends or errors.
/// Returns how many events were published.
pub async fn stream_events(
    http: &reqwest::Client,
    url: &str,
    peer: &Peer,
    hub: &EventHub,
) -> Result<u64, PeerError> {
    let resp = open_stream(http, url).await?;
    let mut body = resp.bytes_stream();
    let mut lines = LineBuffer::default();
    let mut published = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|source| PeerError::Unreachable {
            url: url.to_string(),
            source,
        })?;
        lines.extend(&chunk);
        while let Some(line) = lines.next_line() {
            published += publish_line(&line, peer, hub);
        }
        if lines.overflowed() {
            return Err(PeerError::LineTooLong {
                url: url.to_string(),
                limit: MAX_LINE_BYTES,
            });
        }
    }
    if let Some(line) = lines.finish() {
        published += publish_line(&line, peer, hub);
    }
    Ok(published)
}

fn publish_line(line: &str, peer: &Peer, hub: &EventHub) -> u64 {
    match parse_data_line(line) {
        Some(content) => {
            hub.publish(PeerEvent::from_peer(peer, content));
            1
        }
        None => 0,
    }
}
