//! CLI command modules.

pub mod events;
pub mod http;
pub mod peers;
pub mod tail;
