//! Periodic liveness check
//!
//! Mirrors the original implementation's `checklivepeers`/stabilizer loop:
//! on each tick, send a best-effort `PING` to every known peer — outbound
//! only, no reply awaited — and evict any peer the send failed to reach
//! from both the directory and the model registry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::connection::PeerConnection;
use crate::message;
use crate::node::Node;

/// Spawn the stabilizer as a background task, ticking every `interval`
/// until `shutdown` is set.
pub fn spawn(node: Arc<Node>, interval: Duration, shutdown: Arc<AtomicBool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while !shutdown.load(Ordering::Relaxed) {
            stabilize(&node).await;
            tokio::time::sleep(interval).await;
        }
    })
}

/// Run one stabilization pass.
pub async fn stabilize(node: &Node) {
    let ids = node.directory().peer_ids();
    let mut dead = Vec::new();

    for id in ids {
        let Some(endpoint) = node.directory().get(&id) else {
            continue;
        };
        match PeerConnection::connect(Some(id.clone()), &endpoint.host, endpoint.port).await {
            Ok(mut conn) => {
                if !conn.send(message::PING, "").await {
                    dead.push(id);
                }
                conn.close();
            }
            Err(_) => dead.push(id),
        }
    }

    if dead.is_empty() {
        return;
    }

    tracing::info!(count = dead.len(), "stabilizer evicting unreachable peers");
    for id in &dead {
        node.directory().remove_peer(id);
    }
    node.registry().evict_owners(&dead);
}
