//! meshgate-services: peer directory, fan-out aggregation, event hub and
//! the discovery/ingestion loop that feeds it.

pub mod aggregator;
pub mod directory;
pub mod discovery;
pub mod error;
pub mod http;
pub mod hub;
pub mod ingest;

pub use aggregator::Aggregator;
pub use directory::DirectoryClient;
pub use discovery::{ActiveConnections, ActiveGuard, Discovery};
pub use error::PeerError;
pub use http::PeerAddressing;
pub use hub::{EventHub, SubscriberId, Subscription};
