//! Bounded depth-first bootstrap crawl
//!
//! Mirrors the original implementation's `buildpeers(host, port, hops)`:
//! probe a seed's identity, join it, and — while hops remain and capacity
//! allows — recurse into the peers it reports back through `LIST`. Any
//! failure anywhere along one seed's chain evicts that seed from our own
//! directory, since a half-completed join isn't one we want to keep.

use std::sync::Arc;

use crate::connection::connect_and_send;
use crate::directory::Endpoint;
use crate::error::Error;
use crate::message::{self, JoinPayload};
use crate::node::Node;

/// Crawl outward from `host:port`, descending up to `hops` levels.
pub async fn build_peers(node: Arc<Node>, host: String, port: u16, hops: u32) {
    Box::pin(build_peers_inner(node, host, port, hops)).await
}

async fn build_peers_inner(node: Arc<Node>, host: String, port: u16, hops: u32) {
    if hops == 0 || node.directory().max_peers_reached() {
        return;
    }

    tracing::debug!(%host, port, hops, "bootstrap: contacting seed");

    let mut seed_id: Option<String> = None;

    let outcome: Result<(), Error> = async {
        let name_replies = connect_and_send(&host, port, message::NAME, "", true).await;
        let (_, id) = name_replies
            .into_iter()
            .next()
            .ok_or_else(|| Error::transport("no reply to NAME during bootstrap"))?;
        seed_id = Some(id.clone());

        let join = JoinPayload {
            peer_id: node.self_id().to_string(),
            host: node.self_host().to_string(),
            port: node.self_port(),
        };
        let join_replies = connect_and_send(&host, port, message::JOIN, &join.to_wire(), true).await;
        let (reply_type, reply_body) = join_replies
            .into_iter()
            .next()
            .ok_or_else(|| Error::transport("no reply to JOIN during bootstrap"))?;
        if reply_type == message::ERRO {
            return Err(Error::transport(format!("seed refused join: {reply_body}")));
        }

        node.directory().add_peer(id.clone(), Endpoint::new(host.clone(), port));

        if hops > 1 && !node.directory().max_peers_reached() {
            let list_replies = connect_and_send(&host, port, message::LIST, "", true).await;
            for (_, line) in list_replies.iter().skip(1) {
                let mut parts = line.split_whitespace();
                let (Some(next_id), Some(next_host), Some(next_port)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    continue;
                };
                if next_id == node.self_id() {
                    continue;
                }
                let Ok(next_port) = next_port.parse::<u16>() else {
                    continue;
                };
                Box::pin(build_peers_inner(
                    node.clone(),
                    next_host.to_string(),
                    next_port,
                    hops - 1,
                ))
                .await;
                if node.directory().max_peers_reached() {
                    break;
                }
            }
        }

        Ok(())
    }
    .await;

    if let Err(e) = outcome {
        tracing::debug!(error = %e, %host, port, "bootstrap step failed, unwinding");
        if let Some(id) = seed_id {
            node.directory().remove_peer(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeBuilder;

    #[tokio::test]
    async fn single_hop_join_adds_the_seed() {
        let seed = NodeBuilder::new(8, 0).server_host("127.0.0.1").build().await.unwrap();
        let seed_addr = seed.start().await.unwrap();

        let joiner = NodeBuilder::new(8, 0).server_host("127.0.0.1").build().await.unwrap();
        build_peers(joiner.clone(), seed_addr.ip().to_string(), seed_addr.port(), 1).await;

        assert_eq!(joiner.directory().peer_count(), 1);
        assert!(seed.directory().contains(joiner.self_id()));

        seed.shutdown();
    }

    #[tokio::test]
    async fn failed_join_does_not_leave_the_seed_registered() {
        // nothing listens on this port, so the NAME probe fails outright
        let joiner = NodeBuilder::new(8, 0).server_host("127.0.0.1").build().await.unwrap();
        build_peers(joiner.clone(), "127.0.0.1".to_string(), 1, 1).await;
        assert_eq!(joiner.directory().peer_count(), 0);
    }
}
