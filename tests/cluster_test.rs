//! End-to-end cluster tests.
//!
//! Each test spins up real axum servers on loopback, bound to ephemeral
//! ports, and drives them with a real reqwest client over the actual wire
//! protocol. Heartbeat ticks are driven directly via `Node::run_heartbeat_round`
//! instead of waiting on the real one-second ticker, so these run fast
//! without faking the clock.

use std::sync::Arc;
use std::time::Duration;

use ringmaster::api::HttpServer;
use ringmaster::executor::ScriptExecutor;
use ringmaster::network::{JoinOutcome, NetworkClient};
use ringmaster::state::{MasterState, VoteMessage};
use ringmaster::{Node, Peer, PeerDto, PeerId};

const TEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Bind a fresh node to an ephemeral loopback port and start serving it in
/// the background. Scripts point at `/bin/true` so failover transitions
/// exercise the real spawn path without leaving anything behind.
async fn spawn_node() -> (Arc<Node>, Peer, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let self_peer = Peer::new("127.0.0.1", port);

    let client = NetworkClient::new(TEST_TIMEOUT);
    let executor = ScriptExecutor::new("/bin/true", "/bin/true");
    let node = Arc::new(Node::new(self_peer.clone(), client, executor));

    let server = HttpServer::new(Arc::clone(&node));
    let handle = tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    // Give the listener a moment to start accepting before the caller
    // issues its first request against it.
    tokio::time::sleep(Duration::from_millis(20)).await;
    (node, self_peer, handle)
}

/// S1. Solo bootstrap: empty search list, no peers answer, node becomes its
/// own master.
#[tokio::test]
async fn solo_bootstrap_becomes_master() {
    let (node, self_peer, _handle) = spawn_node().await;

    node.start(&[]).await.unwrap();

    assert_eq!(node.membership.master().await, MasterState::SelfMaster);
    assert_eq!(node.membership.peer_count().await, 0);

    let client = NetworkClient::new(TEST_TIMEOUT);
    assert!(client.probe(&self_peer).await);
    assert!(client.heartbeat(&self_peer).await);
}

/// S2. Two-node join: B probes and joins A, learns A is master, and A
/// records B as a peer.
#[tokio::test]
async fn two_node_join_establishes_master() {
    let (node_a, peer_a, _handle_a) = spawn_node().await;
    node_a.start(&[]).await.unwrap();

    let (node_b, peer_b, _handle_b) = spawn_node().await;
    node_b.start(std::slice::from_ref(&peer_a)).await.unwrap();

    assert_eq!(
        node_b.membership.master().await,
        MasterState::Other(peer_a.id.clone())
    );
    assert!(node_a.membership.contains(&peer_b.id).await);
    assert!(node_b.membership.contains(&peer_a.id).await);
}

/// S3. Duplicate join rejected: re-announcing the same id gets 503 and
/// leaves membership unchanged.
#[tokio::test]
async fn duplicate_join_rejected() {
    let (node_a, peer_a, _handle_a) = spawn_node().await;
    node_a.start(&[]).await.unwrap();

    let (_node_b, peer_b, _handle_b) = spawn_node().await;
    let client = NetworkClient::new(TEST_TIMEOUT);
    let dto = PeerDto::from(&peer_b);

    let outcome = client.join(&peer_a, &dto).await.unwrap();
    assert_eq!(outcome, JoinOutcome::Master);
    assert_eq!(node_a.membership.peer_count().await, 1);

    let http = reqwest::Client::new();
    let resp = http
        .post(format!("{}/new_node", peer_a.base_url()))
        .json(&dto)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.text().await.unwrap(), "Duplicate ID detected.");
    assert_eq!(node_a.membership.peer_count().await, 1);
}

/// S5. Vote during join: a node whose own master is still `Unknown`
/// (mid-election, here simulated by simply never completing `start`)
/// answers `/new_node` with 503 and the joiner surfaces a join error.
#[tokio::test]
async fn join_during_election_returns_503() {
    let (_node_n, peer_n, _handle_n) = spawn_node().await;
    // node_n never calls start(), so its master stays Unknown.

    let (_node_d, peer_d, _handle_d) = spawn_node().await;
    let client = NetworkClient::new(TEST_TIMEOUT);
    let dto = PeerDto::from(&peer_d);

    let result = client.join(&peer_n, &dto).await;
    assert!(matches!(result, Err(ringmaster::Error::JoinCluster(_))));
}

/// S6. Self-vote: a solo node receiving a single-hop vote naming itself as
/// both starter and highest tally confirms itself as master.
#[tokio::test]
async fn self_vote_confirms_solo_master() {
    let (node, peer, _handle) = spawn_node().await;
    node.start(&[]).await.unwrap();

    let mut counts = std::collections::HashMap::new();
    counts.insert(peer.id.clone(), 1u64);
    let msg = VoteMessage {
        starter: peer.id.clone(),
        old_master: PeerId::from("0".to_string()),
        counts,
    };

    let http = reqwest::Client::new();
    let resp = http
        .post(format!("{}/vote", peer.base_url()))
        .json(&msg)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    // The handler dispatches to a detached task; give it a moment to run.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(node.membership.master().await, MasterState::SelfMaster);
}

/// Property 6 / two-node failover: when the only known peer is the master
/// and it becomes unreachable, two heartbeat cycles are enough to promote
/// the survivor to solo master with an empty peer table.
#[tokio::test]
async fn two_node_master_failover_to_solo() {
    let (node_a, peer_a, handle_a) = spawn_node().await;
    node_a.start(&[]).await.unwrap();

    let (node_b, _peer_b, _handle_b) = spawn_node().await;
    node_b.start(std::slice::from_ref(&peer_a)).await.unwrap();
    assert!(node_b.membership.contains(&peer_a.id).await);

    // A goes away: abort its listener task so connections are refused.
    handle_a.abort();
    tokio::time::sleep(Duration::from_millis(20)).await;

    node_b.run_heartbeat_round().await; // first miss
    node_b.run_heartbeat_round().await; // second miss, A declared dead

    assert_eq!(node_b.membership.master().await, MasterState::SelfMaster);
    assert_eq!(node_b.membership.peer_count().await, 0);
}

/// S4. Master failover via ring vote: with A dead and peers {A, B, C}, the
/// higher-id survivor among {B, C} starts a vote; the ring completes and
/// both survivors converge on the same new master.
#[tokio::test]
async fn three_node_master_failover_elects_highest_id_survivor() {
    let (node_a, peer_a, handle_a) = spawn_node().await;
    let (node_b, peer_b, _handle_b) = spawn_node().await;
    let (node_c, peer_c, _handle_c) = spawn_node().await;

    // Wire up the full mesh directly rather than through discovery/join,
    // since this test is about failover mechanics, not startup sequencing
    // (already covered by `two_node_join_establishes_master`).
    node_a.membership.add_peer(peer_b.clone()).await;
    node_a.membership.add_peer(peer_c.clone()).await;
    node_b.membership.add_peer(peer_a.clone()).await;
    node_b.membership.add_peer(peer_c.clone()).await;
    node_c.membership.add_peer(peer_a.clone()).await;
    node_c.membership.add_peer(peer_b.clone()).await;

    node_a.membership.resolve_and_set_master(&peer_a.id).await;
    node_b.membership.resolve_and_set_master(&peer_a.id).await;
    node_c.membership.resolve_and_set_master(&peer_a.id).await;

    let expected_master = if peer_c.id > peer_b.id {
        peer_c.id.clone()
    } else {
        peer_b.id.clone()
    };

    // A goes away.
    handle_a.abort();
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Both survivors independently detect the death over two ticks; only
    // the higher-id one actually starts a vote.
    for _ in 0..2 {
        node_b.run_heartbeat_round().await;
        node_c.run_heartbeat_round().await;
    }

    // Let the ring hop(s) and the final /new_master broadcast settle.
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(
        node_b.membership.master().await.id(&peer_b.id),
        Some(expected_master.clone())
    );
    assert_eq!(
        node_c.membership.master().await.id(&peer_c.id),
        Some(expected_master)
    );
}
