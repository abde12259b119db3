//! Node Orchestration
//!
//! Wires membership, the ring election engine, the HTTP client, and the
//! script executor together: startup discovery and join, heartbeat-driven
//! failure detection, vote casting/relaying, and master announcement.

use crate::error::{Error, Result};
use crate::executor::ScriptExecutor;
use crate::network::{discover_peers, JoinOutcome, NetworkClient};
use crate::peer::{Peer, PeerDto, PeerId};
use crate::state::{ElectionEngine, HeartbeatOutcome, MasterState, Membership, VoteMessage};

pub struct Node {
    pub membership: Membership,
    client: NetworkClient,
    executor: ScriptExecutor,
}

/// Outcome of a `/new_node` join request, mirrored straight into the HTTP
/// handler's status code / body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinRequestOutcome {
    /// We don't have a master yet ourselves; caller should retry later.
    NoMaster,
    /// This peer (by id) is already a member.
    Duplicate,
    Accepted { is_master: bool },
}

impl Node {
    pub fn new(self_peer: Peer, client: NetworkClient, executor: ScriptExecutor) -> Self {
        Self {
            membership: Membership::new(self_peer),
            client,
            executor,
        }
    }

    /// Startup sequence: probe the search list, join whatever answered, and
    /// run the failover script for whichever role we ended up in.
    pub async fn start(&self, search_list: &[Peer]) -> Result<()> {
        let found = discover_peers(&self.client, search_list).await;
        for peer in &found {
            self.membership.add_peer(peer.clone()).await;
        }

        if found.is_empty() {
            tracing::info!("no peers found, becoming master");
            self.set_master(&self.membership.self_id().clone()).await;
        } else {
            self.join_cluster(&found).await?;
        }

        Ok(())
    }

    /// Join each discovered peer in search-list order: later hops can
    /// observe the master recorded by an earlier one, so this cannot be
    /// reordered to, say, a membership-table iteration order.
    async fn join_cluster(&self, found: &[Peer]) -> Result<()> {
        let self_dto = PeerDto::from(self.membership.self_peer());
        for peer in found {
            match self.client.join(peer, &self_dto).await {
                Ok(JoinOutcome::Master) => {
                    tracing::info!("found current master: {}", peer.id);
                    self.set_master(&peer.id).await;
                }
                Ok(JoinOutcome::NotMaster) => {}
                Err(e) => return Err(e),
            }
        }

        if matches!(self.membership.master().await, MasterState::Unknown) {
            return Err(Error::JoinCluster(
                "no peer in the search list reported a master".into(),
            ));
        }
        Ok(())
    }

    /// Resolve `candidate_id` to `self` or a known peer and commit it as
    /// master, running the matching script only when the master actually
    /// changes. This is the single guarded call site: every path that can
    /// determine a master (startup, join, vote completion, a `/new_master`
    /// announcement) goes through here instead of calling the script
    /// executor directly.
    ///
    /// Returns the resolved `Peer` on success, or `None` if `candidate_id`
    /// is neither `self` nor a member of `peers` — that candidate is
    /// logged and otherwise ignored; no transition occurs.
    async fn set_master(&self, candidate_id: &PeerId) -> Option<Peer> {
        let resolution = match self.membership.resolve_and_set_master(candidate_id).await {
            Some(r) => r,
            None => {
                tracing::error!("unknown master candidate {}, ignoring", candidate_id);
                return None;
            }
        };

        if resolution.changed {
            if matches!(resolution.state, MasterState::SelfMaster) {
                self.executor.run_master();
            } else {
                self.executor.run_slave();
            }
        }
        Some(resolution.peer)
    }

    /// One heartbeat sweep over all known peers. Call this on a fixed tick
    /// from the monitor loop.
    pub async fn run_heartbeat_round(&self) {
        for peer in self.membership.peers_snapshot().await {
            if self.client.heartbeat(&peer).await {
                self.membership.mark_alive(&peer.id).await;
                continue;
            }

            match self.membership.apply_heartbeat_failure(&peer.id).await {
                HeartbeatOutcome::Unknown => {}
                HeartbeatOutcome::FirstMiss => {
                    tracing::info!("{} missed first heartbeat", peer.id);
                }
                HeartbeatOutcome::Dead(dead) => {
                    tracing::warn!("{} missed second heartbeat and is determined dead", dead.id);
                    self.handle_peer_death(dead).await;
                }
            }
        }
    }

    async fn handle_peer_death(&self, dead: Peer) {
        let master_id = self.membership.master().await.id(self.membership.self_id());
        if master_id.as_ref() != Some(&dead.id) {
            return;
        }

        tracing::warn!("master is dead");
        let remaining = self.membership.peer_ids().await;

        if remaining.is_empty() {
            tracing::info!("I am alone, and therefore the new master");
            self.set_master(&self.membership.self_id().clone()).await;
            return;
        }

        let ring = ElectionEngine::ring_order(&remaining);
        let highest = ring.first().expect("remaining is non-empty");
        if self.membership.self_id() > highest {
            tracing::info!("starting vote");
            self.start_vote(dead.id).await;
        } else {
            tracing::info!("waiting to vote");
        }
    }

    async fn start_vote(&self, old_master: PeerId) {
        let mut participants = self.membership.peer_ids().await;
        participants.push(self.membership.self_id().clone());
        let (next_id, msg) =
            ElectionEngine::start_vote(self.membership.self_id().clone(), old_master, &participants);
        self.relay_vote(next_id, msg).await;
    }

    /// Entry point for the `/vote` HTTP handler. Runs detached from the
    /// request so the handler can answer 200 immediately instead of
    /// blocking until the whole ring has relayed the vote.
    pub async fn handle_vote(&self, msg: VoteMessage) {
        if ElectionEngine::is_complete(self.membership.self_id(), &msg) {
            self.finish_vote(msg).await;
            return;
        }

        self.membership.remove_peer(&msg.old_master).await;
        let mut participants = self.membership.peer_ids().await;
        participants.push(self.membership.self_id().clone());
        let (next_id, msg) = ElectionEngine::cast(self.membership.self_id(), &participants, msg);
        self.relay_vote(next_id, msg).await;
    }

    async fn finish_vote(&self, msg: VoteMessage) {
        let winner = ElectionEngine::decide(&msg);
        tracing::info!("new master is {}", winner);

        // If the winner left membership mid-round (e.g. a concurrent
        // heartbeat miss), set_master resolves to None: no transition, no
        // announcement. Broadcasting a master id nobody can vouch for would
        // leave the ring in a state no node can have reached honestly.
        let winner_peer = match self.set_master(&winner).await {
            Some(p) => p,
            None => {
                tracing::error!("vote winner {} is no longer a known peer, dropping result", winner);
                return;
            }
        };

        let dto = PeerDto::from(&winner_peer);
        for peer in self.membership.peers_snapshot().await {
            if let Err(e) = self.client.announce_master(&peer, &dto).await {
                tracing::error!("{} did not answer new master announcement: {}", peer.id, e);
            }
        }
    }

    /// Forward a vote message to `next_id`, falling back to the starter on
    /// failure. When `next_id` is this node itself the message is processed
    /// in-process rather than looped back over HTTP.
    async fn relay_vote(&self, next_id: PeerId, msg: VoteMessage) {
        if next_id == *self.membership.self_id() {
            Box::pin(self.handle_vote(msg)).await;
            return;
        }

        let next_peer = match self.membership.peer(&next_id).await {
            Some(p) => p,
            None => {
                tracing::error!("unknown next hop {} for vote, dropping", next_id);
                return;
            }
        };

        tracing::info!("sending vote to {}", next_peer.id);
        if self.client.post_vote(&next_peer, &msg).await.is_ok() {
            return;
        }

        tracing::error!(
            "{} did not accept voting message, sending vote back to starter",
            next_peer.id
        );

        if msg.starter == *self.membership.self_id() {
            Box::pin(self.handle_vote(msg)).await;
            return;
        }

        match self.membership.peer(&msg.starter).await {
            Some(starter_peer) => {
                if self.client.post_vote(&starter_peer, &msg).await.is_err() {
                    tracing::error!(
                        "vote starter {} did not accept the vote either; giving up",
                        starter_peer.id
                    );
                }
            }
            None => tracing::error!("vote starter {} is unknown, giving up", msg.starter),
        }
    }

    /// Entry point for the `/new_node` HTTP handler.
    pub async fn handle_join_request(&self, dto: PeerDto) -> JoinRequestOutcome {
        if matches!(self.membership.master().await, MasterState::Unknown) {
            return JoinRequestOutcome::NoMaster;
        }

        let peer: Peer = dto.into();
        match self.membership.add_peer(peer).await {
            crate::state::AddOutcome::AlreadyPresent => JoinRequestOutcome::Duplicate,
            crate::state::AddOutcome::Added => JoinRequestOutcome::Accepted {
                is_master: self.membership.is_master().await,
            },
        }
    }

    /// Entry point for the `/new_master` HTTP handler. An announcement for
    /// an id that resolves to neither self nor a known peer is logged and
    /// otherwise ignored; no transition occurs.
    pub async fn handle_master_announcement(&self, dto: PeerDto) {
        let peer: Peer = dto.into();
        if self.set_master(&peer.id).await.is_none() {
            tracing::error!("unknown new master id {} in announcement, ignoring", peer.id);
        }
    }
}
