//! Network Module
//!
//! All inter-node communication is plain HTTP. This module owns the
//! outbound side (`NetworkClient`, `discovery`); the inbound side lives in
//! `crate::api`.

pub mod client;
pub mod discovery;

pub use client::{JoinOutcome, NetworkClient};
pub use discovery::discover_peers;

/// Body returned by `GET /` on a healthy node. Used both as our own
/// handler's response and to validate a probed peer's response. The exact
/// string is the cluster's handshake token: two nodes only recognize each
/// other as peers if this matches byte-for-byte.
pub const GREETING: &str = "Netzwerkprogrammierung2020";

/// Body returned by `GET /heartbeat` on a healthy node.
pub const PONG: &str = "pong";
