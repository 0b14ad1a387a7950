//! Pluggable routing: given a peer id, how do we reach it?
//!
//! Separated from [`crate::directory::PeerDirectory`] so alternative routing
//! strategies (e.g. relaying through a supernode) can be swapped in without
//! touching directory storage itself. The default implementation only knows
//! about directly-registered neighbors.

use std::sync::Arc;

use crate::directory::{Endpoint, PeerDirectory, PeerId};

/// Resolves a peer id to a reachable endpoint.
pub trait Router: Send + Sync {
    fn route(&self, peer_id: &str) -> Option<(PeerId, Endpoint)>;
}

/// Routes only to peers this node already knows about directly.
pub struct DirectRouter {
    directory: Arc<PeerDirectory>,
}

impl DirectRouter {
    pub fn new(directory: Arc<PeerDirectory>) -> Self {
        Self { directory }
    }
}

impl Router for DirectRouter {
    fn route(&self, peer_id: &str) -> Option<(PeerId, Endpoint)> {
        self.directory
            .get(peer_id)
            .map(|ep| (peer_id.to_string(), ep))
    }
}
