//! Heartbeat Monitor
//!
//! Drives a fixed one-second tick. All of the actual failure-detection and
//! election logic lives on `Node`; this is just the clock.

use std::sync::Arc;
use std::time::Duration;

use crate::node::Node;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Drive heartbeat rounds on a fixed interval until the process shuts down.
pub async fn run(node: Arc<Node>) {
    let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
    loop {
        interval.tick().await;
        node.run_heartbeat_round().await;
    }
}
