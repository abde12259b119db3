//! Ringmaster Configuration
//!
//! Startup configuration is CLI-flags-only. There is no config file and no
//! persisted state: restarting a node always re-runs discovery from the
//! search list.

use crate::peer::Peer;

/// Parsed, validated startup configuration for one node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Host this node listens on.
    pub host: String,
    /// Port this node listens on.
    pub port: u16,
    /// Seed peers to probe during discovery. Not authoritative membership
    /// — peers that join later via `/new_node` are added the same way
    /// regardless of whether they appeared here.
    pub search_list: Vec<Peer>,
    /// Script to launch when this node becomes master.
    pub master_script_path: String,
    /// Script to launch when this node is a slave.
    pub slave_script_path: String,
}

impl NodeConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a comma-separated `host:port,host:port` search list. Malformed
/// tokens (missing colon, unparseable port, empty host) are silently
/// dropped.
pub fn parse_search_list(raw: &str) -> Vec<Peer> {
    raw.split(',')
        .filter_map(|token| {
            let token = token.trim();
            if token.is_empty() {
                return None;
            }
            let (host, port) = token.rsplit_once(':')?;
            let port: u16 = port.parse().ok()?;
            if host.is_empty() {
                return None;
            }
            Some(Peer::new(host, port))
        })
        .collect()
}
