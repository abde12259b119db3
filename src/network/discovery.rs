//! Peer Discovery
//!
//! Startup discovery probes every address in the search list concurrently
//! and keeps whichever ones answer. There is no broadcast step: the search
//! list configured via `--searchlist` is the operator-supplied universe of
//! possible peers.

use futures::future::join_all;

use crate::network::NetworkClient;
use crate::peer::Peer;

/// Probe every candidate in `search_list` concurrently; return the subset
/// that answered `GET /` with the expected greeting.
pub async fn discover_peers(client: &NetworkClient, search_list: &[Peer]) -> Vec<Peer> {
    let probes = search_list.iter().map(|peer| async move {
        if client.probe(peer).await {
            Some(peer.clone())
        } else {
            None
        }
    });

    join_all(probes).await.into_iter().flatten().collect()
}
