//! Ring-Based Master Election
//!
//! A purely functional implementation of the vote passed hand-to-hand
//! around the ring. All state here is the `VoteMessage` itself — nothing
//! in this module performs I/O, so it can be exercised without a network or
//! an async runtime. The HTTP relay (posting to the next hop, falling back
//! to the starter on failure) lives in `crate::node`, which owns a
//! `NetworkClient`.
//!
//! Ring order is descending by id. A node's next hop is the first
//! participant with an id strictly less than its own, wrapping around to
//! the highest id when the node itself holds the lowest id in the ring.
//! Each hop casts one vote for whichever id is currently highest, so by the
//! time the message completes a full circle the highest-id participant has
//! accrued one vote per live node and every other id has zero.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::peer::PeerId;

/// The vote tally passed between peers during an election round. Wire shape
/// is a flat JSON object: `starter`, `old_master`, and one key per
/// participant id mapped to its running vote count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteMessage {
    pub starter: PeerId,
    pub old_master: PeerId,
    #[serde(flatten)]
    pub counts: HashMap<PeerId, u64>,
}

impl VoteMessage {
    pub fn new(starter: PeerId, old_master: PeerId, participants: &[PeerId]) -> Self {
        let counts = participants.iter().cloned().map(|id| (id, 0)).collect();
        Self {
            starter,
            old_master,
            counts,
        }
    }
}

/// Pure ring election logic, with no fields of its own.
pub struct ElectionEngine;

impl ElectionEngine {
    /// Participants sorted descending by id: the ring order every node
    /// computes independently and must agree on.
    pub fn ring_order(participants: &[PeerId]) -> Vec<PeerId> {
        let mut ring: Vec<PeerId> = participants.to_vec();
        ring.sort_by(|a, b| b.cmp(a));
        ring
    }

    /// First participant with id strictly less than `self_id`, wrapping to
    /// the ring's highest id if `self_id` is the lowest.
    pub fn next_hop(ring: &[PeerId], self_id: &PeerId) -> Option<PeerId> {
        ring.iter()
            .find(|id| *id < self_id)
            .cloned()
            .or_else(|| ring.first().cloned())
    }

    /// Increment the current ring leader's tally and compute where to
    /// forward next. Used both to cast the starter's own opening vote and
    /// to relay a vote this node received.
    pub fn cast(self_id: &PeerId, participants: &[PeerId], mut msg: VoteMessage) -> (PeerId, VoteMessage) {
        let ring = Self::ring_order(participants);
        let leader = ring.first().cloned().unwrap_or_else(|| self_id.clone());
        *msg.counts.entry(leader).or_insert(0) += 1;
        let next = Self::next_hop(&ring, self_id).unwrap_or_else(|| self_id.clone());
        (next, msg)
    }

    /// Build and cast the opening vote message for a freshly started
    /// election. `participants` must already exclude `old_master`.
    pub fn start_vote(starter: PeerId, old_master: PeerId, participants: &[PeerId]) -> (PeerId, VoteMessage) {
        let msg = VoteMessage::new(starter.clone(), old_master, participants);
        Self::cast(&starter, participants, msg)
    }

    /// True once the message has traveled the full ring back to its starter.
    pub fn is_complete(self_id: &PeerId, msg: &VoteMessage) -> bool {
        msg.starter == *self_id
    }

    /// Tally a completed vote. The participant with the most votes wins; a
    /// tie (never arises in practice, since only the ring's current leader
    /// ever accrues votes) is broken in favor of the largest id.
    pub fn decide(msg: &VoteMessage) -> PeerId {
        msg.counts
            .iter()
            .max_by(|(id_a, v_a), (id_b, v_b)| v_a.cmp(v_b).then_with(|| id_a.cmp(id_b)))
            .map(|(id, _)| id.clone())
            .unwrap_or_else(|| msg.starter.clone())
    }
}
