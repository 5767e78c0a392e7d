//! meshgate-core: peer/event data model and gateway configuration.
//! All other meshgate crates depend on this one.

pub mod config;
pub mod event;
pub mod peer;

pub use config::GatewayConfig;
pub use event::PeerEvent;
pub use peer::{Peer, PeerStatus};
