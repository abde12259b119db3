//! Outbound HTTP Client
//!
//! Every call here is a single best-effort HTTP request to one peer: no
//! connection pooling or retries beyond what `reqwest`'s default client
//! gives us for free. Failures are reported as `Ok(false)`/`Err` to the
//! caller rather than retried here — the ring-vote and heartbeat callers
//! already have their own fallback behavior (relay to starter, two-strike
//! miss counting) and retrying underneath them would double up on it.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::peer::{Peer, PeerDto};
use crate::state::VoteMessage;

use super::{GREETING, PONG};

/// Outcome of `POST /new_node` against a peer already in the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The peer reports itself as the master.
    Master,
    /// The peer reports it is not the master.
    NotMaster,
}

/// HTTP client for talking to other ringmaster nodes.
pub struct NetworkClient {
    http: reqwest::Client,
}

impl NetworkClient {
    pub fn new(request_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("reqwest client configuration is static and always valid");
        Self { http }
    }

    /// `GET /` — true if the peer answers with the expected greeting.
    pub async fn probe(&self, peer: &Peer) -> bool {
        match self.http.get(format!("{}/", peer.base_url())).send().await {
            Ok(resp) if resp.status().is_success() => {
                matches!(resp.text().await, Ok(body) if body == GREETING)
            }
            _ => false,
        }
    }

    /// `GET /heartbeat` — true if the peer answers "pong".
    pub async fn heartbeat(&self, peer: &Peer) -> bool {
        match self
            .http
            .get(format!("{}/heartbeat", peer.base_url()))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                matches!(resp.text().await, Ok(body) if body == PONG)
            }
            _ => false,
        }
    }

    /// `POST /new_node` — announce ourselves to an already-active peer.
    pub async fn join(&self, peer: &Peer, self_dto: &PeerDto) -> Result<JoinOutcome> {
        let resp = self
            .http
            .post(format!("{}/new_node", peer.base_url()))
            .json(self_dto)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::JoinCluster(format!(
                "{} rejected join with status {}",
                peer.id, resp.status()
            )));
        }

        let body = resp.text().await.unwrap_or_default();
        Ok(if body == "master" {
            JoinOutcome::Master
        } else {
            JoinOutcome::NotMaster
        })
    }

    /// `POST /vote` — forward a ring vote to the next hop. Fire-and-forget
    /// from the caller's point of view beyond the status code: the vote
    /// handler on the other end replies immediately and processes the vote
    /// in the background.
    pub async fn post_vote(&self, peer: &Peer, msg: &VoteMessage) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/vote", peer.base_url()))
            .json(msg)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Error::Voting(format!(
                "{} rejected vote with status {}",
                peer.id, resp.status()
            )))
        }
    }

    /// `POST /new_master` — announce the decided master to a peer.
    pub async fn announce_master(&self, peer: &Peer, master: &PeerDto) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/new_master", peer.base_url()))
            .json(master)
            .send()
            .await?;

        resp.error_for_status().map(|_| ()).map_err(Error::Network)
    }
}
