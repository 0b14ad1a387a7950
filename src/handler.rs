//! Handler dispatch table
//!
//! A `HandlerTable` is built once, through [`HandlerTableBuilder`], and
//! never mutated afterward — the table a connection is dispatched against
//! is the table the node was constructed with. Each handler owns whatever
//! shared state it needs (an `Arc` clone of the directory, registry, etc.)
//! rather than reaching into a god object.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::connection::PeerConnection;

/// Handles one message type. Takes the connection by mutable reference so
/// the caller retains ownership and closes it once the handler returns,
/// regardless of how the handler's internals behaved.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, conn: &mut PeerConnection, payload: String);
}

/// An immutable, post-construction map from 4-character message type to
/// the handler responsible for it.
pub struct HandlerTable {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerTable {
    pub fn get(&self, msg_type: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(msg_type)
    }
}

/// Builder for a [`HandlerTable`]. Registration order doesn't matter; each
/// message type may be registered at most once, and the builder is
/// consumed on `build()` so the resulting table can never be reopened.
pub struct HandlerTableBuilder {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerTableBuilder {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(mut self, msg_type: &str, handler: Arc<dyn Handler>) -> Self {
        assert_eq!(msg_type.len(), 4, "message type must be exactly 4 characters");
        self.handlers.insert(msg_type.to_string(), handler);
        self
    }

    pub fn build(self) -> HandlerTable {
        HandlerTable {
            handlers: self.handlers,
        }
    }
}

impl Default for HandlerTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl Handler for EchoHandler {
        async fn handle(&self, conn: &mut PeerConnection, payload: String) {
            conn.send("REPL", &payload).await;
        }
    }

    #[test]
    fn lookup_returns_registered_handler() {
        let table = HandlerTableBuilder::new()
            .register("PING", Arc::new(EchoHandler))
            .build();
        assert!(table.get("PING").is_some());
        assert!(table.get("QUIT").is_none());
    }

    #[test]
    #[should_panic(expected = "exactly 4 characters")]
    fn register_rejects_short_type() {
        HandlerTableBuilder::new().register("BAD", Arc::new(EchoHandler));
    }
}
