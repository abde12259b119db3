//! Cluster Membership
//!
//! Tracks the set of live peers and the currently known master under one
//! `RwLock`. Peers and master share a single lock rather than one each
//! so that "is this id still a member" and "commit it as master" happen
//! as one atomic step — resolving a master candidate and a concurrent
//! heartbeat miss removing that same peer can never interleave.

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::peer::{Peer, PeerId};

/// What this node currently believes about the cluster's master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterState {
    /// No master has been determined yet (before the initial join completes).
    Unknown,
    /// This node is the master.
    SelfMaster,
    /// Some other peer is the master.
    Other(PeerId),
}

impl MasterState {
    pub fn id(&self, self_id: &PeerId) -> Option<PeerId> {
        match self {
            MasterState::Unknown => None,
            MasterState::SelfMaster => Some(self_id.clone()),
            MasterState::Other(id) => Some(id.clone()),
        }
    }
}

/// Result of registering a peer via `add_peer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// Result of recording a missed heartbeat against a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    /// Peer was already gone; nothing to do.
    Unknown,
    /// First consecutive miss: peer marked inactive, still a member.
    FirstMiss,
    /// Second consecutive miss: peer removed from the cluster.
    Dead(Peer),
}

/// Outcome of resolving a master candidate id against `self`/`peers` and
/// (if it resolved) committing it.
#[derive(Debug, Clone)]
pub struct MasterResolution {
    pub state: MasterState,
    pub peer: Peer,
    /// Whether this call actually changed `master` (false if it already
    /// held this value).
    pub changed: bool,
}

struct Inner {
    peers: HashMap<PeerId, Peer>,
    master: MasterState,
}

/// Tracks peer membership and master state for one node.
pub struct Membership {
    self_peer: Peer,
    inner: RwLock<Inner>,
}

impl Membership {
    pub fn new(self_peer: Peer) -> Self {
        Self {
            self_peer,
            inner: RwLock::new(Inner {
                peers: HashMap::new(),
                master: MasterState::Unknown,
            }),
        }
    }

    pub fn self_peer(&self) -> &Peer {
        &self.self_peer
    }

    pub fn self_id(&self) -> &PeerId {
        &self.self_peer.id
    }

    /// Register a peer. Duplicate ids (same host:port, hence same derived
    /// id) are rejected rather than overwritten.
    pub async fn add_peer(&self, peer: Peer) -> AddOutcome {
        if peer.id == self.self_peer.id {
            return AddOutcome::AlreadyPresent;
        }
        let mut inner = self.inner.write().await;
        if inner.peers.contains_key(&peer.id) {
            AddOutcome::AlreadyPresent
        } else {
            inner.peers.insert(peer.id.clone(), peer);
            AddOutcome::Added
        }
    }

    pub async fn remove_peer(&self, id: &PeerId) -> Option<Peer> {
        self.inner.write().await.peers.remove(id)
    }

    pub async fn contains(&self, id: &PeerId) -> bool {
        self.inner.read().await.peers.contains_key(id)
    }

    /// Look up a single known peer by id (excludes self).
    pub async fn peer(&self, id: &PeerId) -> Option<Peer> {
        self.inner.read().await.peers.get(id).cloned()
    }

    /// Snapshot of peer ids, excluding self.
    pub async fn peer_ids(&self) -> Vec<PeerId> {
        self.inner.read().await.peers.keys().cloned().collect()
    }

    /// Snapshot of all known peers, excluding self.
    pub async fn peers_snapshot(&self) -> Vec<Peer> {
        self.inner.read().await.peers.values().cloned().collect()
    }

    pub async fn peer_count(&self) -> usize {
        self.inner.read().await.peers.len()
    }

    /// Record a missed heartbeat against `id`, applying the two-strike rule:
    /// the first miss marks the peer inactive, the second removes it.
    pub async fn apply_heartbeat_failure(&self, id: &PeerId) -> HeartbeatOutcome {
        let mut inner = self.inner.write().await;
        match inner.peers.get_mut(id) {
            None => HeartbeatOutcome::Unknown,
            Some(peer) if peer.active => {
                peer.active = false;
                HeartbeatOutcome::FirstMiss
            }
            Some(_) => {
                let dead = inner.peers.remove(id).expect("checked Some above");
                HeartbeatOutcome::Dead(dead)
            }
        }
    }

    /// Record a successful heartbeat, clearing any prior miss.
    pub async fn mark_alive(&self, id: &PeerId) {
        if let Some(peer) = self.inner.write().await.peers.get_mut(id) {
            peer.active = true;
        }
    }

    pub async fn master(&self) -> MasterState {
        self.inner.read().await.master.clone()
    }

    pub async fn is_master(&self) -> bool {
        matches!(self.inner.read().await.master, MasterState::SelfMaster)
    }

    /// Resolve `candidate_id` against `self` or a known peer and, only if
    /// it resolves, commit it as `master` in the same lock acquisition.
    ///
    /// Returns `None` if `candidate_id` is neither `self` nor a member of
    /// `peers` — the distilled spec's "vote for unknown peer is silently
    /// ignored" / "unknown new master id in vote result: logged; no
    /// transition occurs" rule. Doing the membership check and the commit
    /// under one write lock closes the race where a peer is removed (e.g.
    /// by a concurrent heartbeat miss) between "was this id known" and
    /// "make it master".
    pub async fn resolve_and_set_master(&self, candidate_id: &PeerId) -> Option<MasterResolution> {
        let mut inner = self.inner.write().await;

        let (state, peer) = if *candidate_id == self.self_peer.id {
            (MasterState::SelfMaster, self.self_peer.clone())
        } else if let Some(p) = inner.peers.get(candidate_id) {
            (MasterState::Other(p.id.clone()), p.clone())
        } else {
            return None;
        };

        let changed = inner.master != state;
        if changed {
            inner.master = state.clone();
        }
        Some(MasterResolution {
            state,
            peer,
            changed,
        })
    }
}
