//! Model registry: which model lives where
//!
//! Mirrors a prior Python implementation's `model_map`, which stored
//! `name -> (peerid, host, port)` for every model this node has learned
//! about, whether hosted locally or on a remote peer. We split "who owns
//! it" into an explicit [`Owner`] rather than special-casing our own id as
//! a string, but on the wire a self-owned model is still rewritten to this
//! node's own id, exactly as before.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::directory::PeerId;

/// Who serves a registered model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// Served by this node's own [`crate::predictor::LocalModels`].
    SelfOwned,
    /// Served by a remote peer.
    Remote(PeerId),
}

#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub owner: Owner,
    pub host: String,
    pub port: u16,
}

/// This node's knowledge of model -> owner across the whole overlay it has
/// discovered so far, not just direct neighbors.
pub struct ModelRegistry {
    entries: RwLock<HashMap<String, ModelEntry>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<ModelEntry> {
        self.entries.read().get(name).cloned()
    }

    /// Register a model this node serves locally.
    pub fn insert_self(&self, name: impl Into<String>, host: impl Into<String>, port: u16) {
        self.entries.write().insert(
            name.into(),
            ModelEntry {
                owner: Owner::SelfOwned,
                host: host.into(),
                port,
            },
        );
    }

    /// Register a model a remote peer answered a query for. Returns
    /// `false` without modifying anything if the model is already known —
    /// first write wins, matching the original's duplicate-response check.
    pub fn insert_remote(&self, name: &str, owner: PeerId, host: String, port: u16) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(name) {
            return false;
        }
        entries.insert(
            name.to_string(),
            ModelEntry {
                owner: Owner::Remote(owner),
                host,
                port,
            },
        );
        true
    }

    pub fn remove(&self, name: &str) -> Option<ModelEntry> {
        self.entries.write().remove(name)
    }

    /// Drop every entry owned by one of `dead_peers`. Self-owned entries
    /// are never affected. Called by the stabilizer after it evicts
    /// unreachable peers from the directory.
    pub fn evict_owners(&self, dead_peers: &[PeerId]) {
        self.entries.write().retain(|_, entry| match &entry.owner {
            Owner::SelfOwned => true,
            Owner::Remote(id) => !dead_peers.contains(id),
        });
    }

    /// The id to put on the wire for a model's owner: this node's own id
    /// for a self-owned model, or the remote peer's id otherwise.
    pub fn owner_wire_id(&self, name: &str, self_id: &str) -> Option<(String, String, u16)> {
        self.get(name).map(|entry| {
            let owner_id = match entry.owner {
                Owner::SelfOwned => self_id.to_string(),
                Owner::Remote(id) => id,
            };
            (owner_id, entry.host, entry.port)
        })
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
