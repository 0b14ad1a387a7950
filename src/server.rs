//! Accept loop and per-connection dispatch
//!
//! Each accepted connection gets its own task: one request frame is read,
//! routed through the [`HandlerTable`], and the connection is closed when
//! the handler returns, regardless of whether the handler itself sent
//! anything back. This is a connection-per-exchange server, not a
//! connection-per-session one — a peer opens a fresh socket for every
//! message it wants answered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::connection::PeerConnection;
use crate::error::{Error, Result};
use crate::handler::HandlerTable;

/// Bind the listening socket for this node.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = format!("0.0.0.0:{port}");
    TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::transport(format!("failed to bind {addr}: {e}")))
}

/// Read one frame off `stream`, dispatch it through `table`, then close.
async fn dispatch(stream: TcpStream, table: Arc<HandlerTable>) {
    let mut conn = PeerConnection::from_stream(stream);

    match conn.recv().await {
        Some((msg_type, payload)) => {
            let msg_type = msg_type.to_uppercase();
            match table.get(&msg_type) {
                Some(handler) => handler.handle(&mut conn, payload).await,
                None => tracing::debug!(msg_type = %msg_type, "no handler registered for message type"),
            }
        }
        None => tracing::debug!("connection closed before a frame was received"),
    }

    conn.close();
}

/// Accept connections until `shutdown` is set, spawning a dispatch task
/// per connection. Accept errors are logged and backed off briefly rather
/// than treated as fatal, since a single bad accept shouldn't take the
/// whole node down.
pub async fn serve(listener: TcpListener, table: Arc<HandlerTable>, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        match listener.accept().await {
            Ok((stream, addr)) => {
                tracing::debug!(%addr, "accepted connection");
                let table = table.clone();
                tokio::spawn(dispatch(stream, table));
            }
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}
