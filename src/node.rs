//! Node: wires the directory, registry, predictors, and handlers together
//!
//! [`NodeBuilder`] assembles an immutable [`HandlerTable`] once, at
//! construction, the same way the original implementation's `addhandler`
//! calls all happened in `__init__` before `mainloop` ever ran. Everything
//! downstream — the server, the bootstrap crawl, the stabilizer — operates
//! on the resulting `Arc<Node>`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::connection::{connect_and_send, PeerConnection};
use crate::directory::{Endpoint, PeerDirectory};
use crate::error::Result;
use crate::handler::{Handler, HandlerTable, HandlerTableBuilder};
use crate::message::{self, InferPayload, JoinPayload, QueryPayload, QuitPayload, ResponsePayload};
use crate::predictor::LocalModels;
use crate::registry::ModelRegistry;
use crate::selfaddr::discover_self_host;
use crate::server;

/// A running (or not-yet-started) node in the overlay.
pub struct Node {
    self_id: String,
    self_host: String,
    self_port: u16,
    directory: Arc<PeerDirectory>,
    registry: Arc<ModelRegistry>,
    models: Arc<LocalModels>,
    handlers: Arc<HandlerTable>,
    shutdown: Arc<AtomicBool>,
}

impl Node {
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    pub fn self_host(&self) -> &str {
        &self.self_host
    }

    pub fn self_port(&self) -> u16 {
        self.self_port
    }

    pub fn directory(&self) -> &Arc<PeerDirectory> {
        &self.directory
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn models(&self) -> &Arc<LocalModels> {
        &self.models
    }

    /// Load a predictor under `name`, serving it locally from now on.
    pub fn load(&self, name: impl Into<String>, predictor: Arc<dyn crate::predictor::Predictor>) {
        let name = name.into();
        self.models.load(name.clone(), predictor);
        self.registry.insert_self(name, self.self_host.clone(), self.self_port);
    }

    /// Stop serving a predictor.
    pub fn unload(&self, name: &str) {
        self.models.unload(name);
        self.registry.remove(name);
    }

    /// Crawl outward from a seed peer, per the bounded depth-first protocol.
    pub async fn bootstrap(self: &Arc<Self>, host: impl Into<String>, port: u16, hops: u32) {
        crate::bootstrap::build_peers(self.clone(), host.into(), port, hops).await;
    }

    /// Spawn the periodic liveness check as a background task.
    pub fn start_stabilizer(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        crate::stabilizer::spawn(self.clone(), interval, self.shutdown.clone())
    }

    /// Bind the listening socket and spawn the accept loop in the
    /// background, returning as soon as it's ready to accept. Mirrors the
    /// original implementation's `mainloop`, split so the caller can start
    /// serving and still go on to bootstrap and launch the stabilizer.
    pub async fn start(self: &Arc<Self>) -> Result<std::net::SocketAddr> {
        let listener = server::bind(self.self_port).await?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| crate::error::Error::transport(e.to_string()))?;
        tracing::info!(peer_id = %self.self_id, addr = %local_addr, "node listening");

        let handlers = self.handlers.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            server::serve(listener, handlers, shutdown).await;
        });

        Ok(local_addr)
    }

    /// Signal the accept loop and stabilizer to stop.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

/// Builds a [`Node`], resolving a self-address if one wasn't given.
pub struct NodeBuilder {
    max_peers: usize,
    server_port: u16,
    server_host: Option<String>,
    my_id: Option<String>,
}

impl NodeBuilder {
    pub fn new(max_peers: usize, server_port: u16) -> Self {
        Self {
            max_peers,
            server_port,
            server_host: None,
            my_id: None,
        }
    }

    pub fn server_host(mut self, host: impl Into<String>) -> Self {
        self.server_host = Some(host.into());
        self
    }

    pub fn my_id(mut self, id: impl Into<String>) -> Self {
        self.my_id = Some(id.into());
        self
    }

    pub async fn build(self) -> Result<Arc<Node>> {
        let host = match self.server_host {
            Some(h) => h,
            None => discover_self_host().await?,
        };
        let self_id = self
            .my_id
            .unwrap_or_else(|| format!("{}:{}", host, self.server_port));

        let directory = Arc::new(PeerDirectory::new(self_id.clone(), self.max_peers));
        let registry = Arc::new(ModelRegistry::new());
        let models = Arc::new(LocalModels::new());

        let handlers = HandlerTableBuilder::new()
            .register(
                message::NAME,
                Arc::new(NameHandler {
                    self_id: self_id.clone(),
                }),
            )
            .register(
                message::LIST,
                Arc::new(ListHandler {
                    directory: directory.clone(),
                }),
            )
            .register(
                message::JOIN,
                Arc::new(JoinHandler {
                    directory: directory.clone(),
                }),
            )
            .register(
                message::QUIT,
                Arc::new(QuitHandler {
                    directory: directory.clone(),
                }),
            )
            .register(
                message::QUER,
                Arc::new(QueryHandler {
                    directory: directory.clone(),
                    registry: registry.clone(),
                    self_id: self_id.clone(),
                }),
            )
            .register(
                message::RESP,
                Arc::new(RespHandler {
                    registry: registry.clone(),
                }),
            )
            .register(
                message::INFR,
                Arc::new(InferHandler {
                    models: models.clone(),
                }),
            )
            .register(message::PING, Arc::new(PingHandler))
            .build();

        Ok(Arc::new(Node {
            self_id,
            self_host: host,
            self_port: self.server_port,
            directory,
            registry,
            models,
            handlers: Arc::new(handlers),
            shutdown: Arc::new(AtomicBool::new(false)),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────

struct NameHandler {
    self_id: String,
}

#[async_trait]
impl Handler for NameHandler {
    async fn handle(&self, conn: &mut PeerConnection, _payload: String) {
        conn.send(message::REPL, &self.self_id).await;
    }
}

struct ListHandler {
    directory: Arc<PeerDirectory>,
}

#[async_trait]
impl Handler for ListHandler {
    async fn handle(&self, conn: &mut PeerConnection, _payload: String) {
        let snapshot = self.directory.snapshot();
        if !conn.send(message::REPL, &snapshot.len().to_string()).await {
            return;
        }
        for (id, ep) in snapshot {
            let line = format!("{} {} {}", id, ep.host, ep.port);
            if !conn.send(message::REPL, &line).await {
                return;
            }
        }
    }
}

struct JoinHandler {
    directory: Arc<PeerDirectory>,
}

#[async_trait]
impl Handler for JoinHandler {
    async fn handle(&self, conn: &mut PeerConnection, payload: String) {
        if self.directory.max_peers_reached() {
            conn.send(message::ERRO, "Join: too many peers").await;
            return;
        }
        let join = match JoinPayload::parse(&payload) {
            Ok(j) => j,
            Err(_) => {
                conn.send(message::ERRO, "Join: incorrect arguments").await;
                return;
            }
        };
        let added = self.directory.add_peer(
            join.peer_id.clone(),
            Endpoint::new(join.host.clone(), join.port),
        );
        if added {
            let reply = format!("Join: peer added: {} ({}:{})", join.peer_id, join.host, join.port);
            conn.send(message::REPL, &reply).await;
        } else {
            let reply = format!("Join: peer already inserted or is self: {}", join.peer_id);
            conn.send(message::ERRO, &reply).await;
        }
    }
}

struct QuitHandler {
    directory: Arc<PeerDirectory>,
}

#[async_trait]
impl Handler for QuitHandler {
    async fn handle(&self, conn: &mut PeerConnection, payload: String) {
        let quit = match QuitPayload::parse(&payload) {
            Ok(q) => q,
            Err(_) => {
                conn.send(message::ERRO, "Quit: incorrect arguments").await;
                return;
            }
        };
        if self.directory.remove_peer(&quit.peer_id) {
            let reply = format!("Quit: peer removed: {}", quit.peer_id);
            conn.send(message::REPL, &reply).await;
        } else {
            let reply = format!("Quit: peer not found: {}", quit.peer_id);
            conn.send(message::ERRO, &reply).await;
        }
    }
}

struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, conn: &mut PeerConnection, _payload: String) {
        conn.send(message::REPL, "Pong").await;
    }
}

struct QueryHandler {
    directory: Arc<PeerDirectory>,
    registry: Arc<ModelRegistry>,
    self_id: String,
}

#[async_trait]
impl Handler for QueryHandler {
    async fn handle(&self, conn: &mut PeerConnection, payload: String) {
        let query = match QueryPayload::parse(&payload) {
            Ok(q) => q,
            Err(_) => {
                conn.send(message::ERRO, "Quer: incorrect arguments").await;
                return;
            }
        };

        // Acknowledge immediately and release the connection: any flooding
        // or reply happens on a detached task so this handler never holds
        // a registry or directory lock across outbound I/O.
        conn.send(message::REPL, &format!("Query ACK: {}", query.model)).await;

        let directory = self.directory.clone();
        let registry = self.registry.clone();
        let self_id = self.self_id.clone();
        tokio::spawn(async move {
            process_query(directory, registry, self_id, query).await;
        });
    }
}

async fn process_query(
    directory: Arc<PeerDirectory>,
    registry: Arc<ModelRegistry>,
    self_id: String,
    query: QueryPayload,
) {
    if let Some((owner, host, port)) = registry.owner_wire_id(&query.model, &self_id) {
        let response = ResponsePayload {
            model: query.model.clone(),
            owner_id: owner,
            host,
            port,
        };
        connect_and_send(
            &query.origin_host,
            query.origin_port,
            message::RESP,
            &response.to_wire(),
            false,
        )
        .await;
        return;
    }

    if query.ttl == 0 {
        return;
    }

    let forwarded = QueryPayload {
        ttl: query.ttl - 1,
        ..query.clone()
    };
    for (id, ep) in directory.snapshot() {
        if id == query.origin_id {
            continue;
        }
        let payload = forwarded.to_wire();
        tokio::spawn(async move {
            connect_and_send(&ep.host, ep.port, message::QUER, &payload, false).await;
        });
    }
}

struct RespHandler {
    registry: Arc<ModelRegistry>,
}

#[async_trait]
impl Handler for RespHandler {
    async fn handle(&self, conn: &mut PeerConnection, payload: String) {
        let resp = match ResponsePayload::parse(&payload) {
            Ok(r) => r,
            Err(_) => {
                conn.send(message::ERRO, "Resp: incorrect arguments").await;
                return;
            }
        };
        if self.registry.contains(&resp.model) {
            tracing::debug!(model = %resp.model, owner = %resp.owner_id, "duplicate query response dropped");
            return;
        }
        self.registry
            .insert_remote(&resp.model, resp.owner_id, resp.host, resp.port);
        // No reply: a RESP is itself a reply, and its sender isn't waiting.
    }
}

struct InferHandler {
    models: Arc<LocalModels>,
}

#[async_trait]
impl Handler for InferHandler {
    async fn handle(&self, conn: &mut PeerConnection, payload: String) {
        let infer = match InferPayload::parse(&payload) {
            Ok(i) => i,
            Err(_) => {
                conn.send(message::ERRO, "Infr: incorrect arguments").await;
                return;
            }
        };

        let Some(predictor) = self.models.get(&infer.model) else {
            conn.send(message::ERRO, "Model not found").await;
            return;
        };

        let input: serde_json::Value = match serde_json::from_str(&infer.input_json) {
            Ok(v) => v,
            Err(e) => {
                conn.send(message::ERRO, &format!("Error running inference: {e}")).await;
                return;
            }
        };

        match predictor.predict(input).await {
            Ok(output) => match serde_json::to_string(&output) {
                Ok(encoded) => {
                    conn.send(message::REPL, &encoded).await;
                }
                Err(e) => {
                    conn.send(message::ERRO, &format!("Error running inference: {e}")).await;
                }
            },
            Err(e) => {
                conn.send(message::ERRO, &format!("Error running inference: {e}")).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::LinearModel;

    async fn test_node(max_peers: usize, port: u16) -> Arc<Node> {
        NodeBuilder::new(max_peers, port)
            .server_host("127.0.0.1")
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn name_handler_replies_with_self_id() {
        let node = test_node(8, 9099).await;
        let listener = server::bind(0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let handlers = Arc::new(
            HandlerTableBuilder::new()
                .register(
                    message::NAME,
                    Arc::new(NameHandler {
                        self_id: node.self_id().to_string(),
                    }),
                )
                .build(),
        );
        tokio::spawn(async move { server::serve(listener, handlers, shutdown_clone).await });

        let replies = connect_and_send(&addr.ip().to_string(), addr.port(), message::NAME, "", true).await;
        assert_eq!(replies, vec![(message::REPL.to_string(), node.self_id().to_string())]);

        shutdown.store(true, Ordering::Relaxed);
    }

    #[tokio::test]
    async fn join_then_list_reflects_the_new_peer() {
        let node = test_node(8, 9100).await;
        let listener = server::bind(0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handlers = Arc::new(
            HandlerTableBuilder::new()
                .register(
                    message::JOIN,
                    Arc::new(JoinHandler {
                        directory: node.directory.clone(),
                    }),
                )
                .register(
                    message::LIST,
                    Arc::new(ListHandler {
                        directory: node.directory.clone(),
                    }),
                )
                .build(),
        );
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let table = handlers.clone();
        tokio::spawn(async move { server::serve(listener, table, shutdown_clone).await });

        let join_payload = JoinPayload {
            peer_id: "peer-a".into(),
            host: "10.0.0.5".into(),
            port: 7000,
        };
        let replies = connect_and_send(
            &addr.ip().to_string(),
            addr.port(),
            message::JOIN,
            &join_payload.to_wire(),
            true,
        )
        .await;
        assert_eq!(replies[0].0, message::REPL);

        let list_replies =
            connect_and_send(&addr.ip().to_string(), addr.port(), message::LIST, "", true).await;
        assert_eq!(list_replies[0], ("REPL".to_string(), "1".to_string()));
        assert_eq!(list_replies[1].1, "peer-a 10.0.0.5 7000");

        shutdown.store(true, Ordering::Relaxed);
    }

    #[tokio::test]
    async fn join_over_capacity_is_rejected() {
        let node = test_node(1, 9101).await;
        node.directory.add_peer("peer-a", Endpoint::new("10.0.0.1", 9000));

        let listener = server::bind(0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handlers = Arc::new(
            HandlerTableBuilder::new()
                .register(
                    message::JOIN,
                    Arc::new(JoinHandler {
                        directory: node.directory.clone(),
                    }),
                )
                .build(),
        );
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move { server::serve(listener, handlers, shutdown_clone).await });

        let join_payload = JoinPayload {
            peer_id: "peer-b".into(),
            host: "10.0.0.2".into(),
            port: 9001,
        };
        let replies = connect_and_send(
            &addr.ip().to_string(),
            addr.port(),
            message::JOIN,
            &join_payload.to_wire(),
            true,
        )
        .await;
        assert_eq!(replies[0].0, message::ERRO);

        shutdown.store(true, Ordering::Relaxed);
    }

    #[tokio::test]
    async fn infer_round_trips_through_a_loaded_linear_model() {
        let node = test_node(8, 9102).await;
        node.load("sentiment", Arc::new(LinearModel::new(vec![1.0, 1.0], 0.0)));

        let listener = server::bind(0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let handlers = Arc::new(
            HandlerTableBuilder::new()
                .register(
                    message::INFR,
                    Arc::new(InferHandler {
                        models: node.models.clone(),
                    }),
                )
                .build(),
        );
        tokio::spawn(async move { server::serve(listener, handlers, shutdown_clone).await });

        let infer = InferPayload {
            model: "sentiment".into(),
            input_json: "[1.0, 2.0]".into(),
        };
        let replies = connect_and_send(
            &addr.ip().to_string(),
            addr.port(),
            message::INFR,
            &infer.to_wire(),
            true,
        )
        .await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, message::REPL);
        let parsed: serde_json::Value = serde_json::from_str(&replies[0].1).unwrap();
        assert_eq!(parsed, serde_json::json!({"prediction": 3.0}));

        shutdown.store(true, Ordering::Relaxed);
    }
}
