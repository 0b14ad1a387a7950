//! The peer directory: this node's view of its direct neighbors
//!
//! A single `RwLock`-guarded map, mirroring the one `peerlock` a prior
//! Python implementation took around every mutation of its peer dict.
//! Capacity, self-id rejection, and duplicate rejection are all enforced
//! at the point of insertion so callers never have to re-check them.

use std::collections::HashMap;

use parking_lot::RwLock;

/// A peer's identifier on the wire. Opaque to everything but equality.
pub type PeerId = String;

/// Where a peer can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// This node's directory of directly-known peers.
pub struct PeerDirectory {
    self_id: PeerId,
    max_peers: usize,
    peers: RwLock<HashMap<PeerId, Endpoint>>,
}

impl PeerDirectory {
    /// `max_peers == 0` means unbounded.
    pub fn new(self_id: impl Into<PeerId>, max_peers: usize) -> Self {
        Self {
            self_id: self_id.into(),
            max_peers,
            peers: RwLock::new(HashMap::new()),
        }
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    pub fn max_peers(&self) -> usize {
        self.max_peers
    }

    pub fn max_peers_reached(&self) -> bool {
        self.max_peers != 0 && self.peers.read().len() >= self.max_peers
    }

    /// Insert a peer. Returns `false` (no-op) if the id is our own id, the
    /// peer is already known, or the directory is at capacity.
    pub fn add_peer(&self, id: impl Into<PeerId>, endpoint: Endpoint) -> bool {
        let id = id.into();
        if id == self.self_id {
            return false;
        }
        let mut peers = self.peers.write();
        if self.max_peers != 0 && peers.len() >= self.max_peers {
            return false;
        }
        if peers.contains_key(&id) {
            return false;
        }
        peers.insert(id, endpoint);
        true
    }

    /// Remove a peer. Returns `true` if it was present.
    pub fn remove_peer(&self, id: &str) -> bool {
        self.peers.write().remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.peers.read().contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Endpoint> {
        self.peers.read().get(id).cloned()
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.read().keys().cloned().collect()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.read().len()
    }

    /// A consistent, point-in-time copy of the whole directory, used by the
    /// `LIST` handler and by anything that needs to iterate neighbors
    /// without holding the lock across network I/O.
    pub fn snapshot(&self) -> Vec<(PeerId, Endpoint)> {
        self.peers
            .read()
            .iter()
            .map(|(id, ep)| (id.clone(), ep.clone()))
            .collect()
    }
}
