//! Errors from talking to the seed directory or to peers.
//!
//! None of these reach gateway clients directly: callers log them and
//! drop the affected peer's contribution.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Connect failure, timeout, or a read error mid-body.
    #[error("{url} unreachable: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}")]
    BadStatus { url: String, status: StatusCode },
    #[error("malformed body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} sent a line longer than {limit} bytes")]
    LineTooLong { url: String, limit: usize },
}

impl PeerError {
    pub fn url(&self) -> &str {
        match self {
            PeerError::Unreachable { url, .. }
            | PeerError::BadStatus { url, .. }
            | PeerError::Decode { url, .. }
            | PeerError::LineTooLong { url, .. } => url,
        }
    }
}
