//! Peer Descriptor
//!
//! Identity and network address of a node in the cluster.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic peer identifier: the hexadecimal SHA-256 digest of
/// `"<host>:<port>"`. Ordered lexicographically over the hex string, which
/// is what the ring vote and the two-strike death check rely on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_address(host: &str, port: u16) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{host}:{port}").as_bytes());
        Self(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PeerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A cluster member: identity, address, and local liveness flag.
///
/// `active` is meaningful only on the node that owns this copy — it
/// records whether the *last* heartbeat this node sent succeeded, and is
/// not part of the wire representation.
#[derive(Debug, Clone)]
pub struct Peer {
    pub id: PeerId,
    pub host: String,
    pub port: u16,
    pub active: bool,
}

impl Peer {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let id = PeerId::from_address(&host, port);
        Self {
            id,
            host,
            port,
            active: true,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Peer {}

impl std::hash::Hash for Peer {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Wire representation used by `/new_node`, `/new_master`, and as the
/// payload type peers exchange their descriptors in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerDto {
    pub id: PeerId,
    pub host: String,
    pub port: u16,
}

impl From<&Peer> for PeerDto {
    fn from(p: &Peer) -> Self {
        Self {
            id: p.id.clone(),
            host: p.host.clone(),
            port: p.port,
        }
    }
}

impl From<PeerDto> for Peer {
    fn from(dto: PeerDto) -> Self {
        // Re-derive the id from host/port rather than trusting the wire
        // value, so a forged id can never desync from the address it
        // claims to belong to.
        Peer::new(dto.host, dto.port)
    }
}
