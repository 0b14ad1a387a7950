//! A single peer exchange: one request frame, zero or more reply frames
//!
//! [`PeerConnection`] never surfaces I/O or protocol errors to its caller —
//! matching the original implementation's `recvdata`, which swallows any
//! exception and reports end-of-stream instead. Callers that need to know
//! *why* a read failed should look at the `tracing` output; the protocol
//! only distinguishes "got a frame" from "didn't."

use tokio::net::TcpStream;

use crate::directory::PeerId;
use crate::error::{Error, Result};
use crate::wire;

/// One TCP connection carrying a single request/reply exchange.
pub struct PeerConnection {
    peer_id: Option<PeerId>,
    stream: Option<TcpStream>,
}

impl PeerConnection {
    /// Dial a peer. The connection itself has no identity until a `NAME`
    /// exchange establishes one; `peer_id` here is only the caller's prior
    /// belief about who it's dialing, kept for logging.
    pub async fn connect(peer_id: Option<PeerId>, host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| Error::transport(format!("connect to {host}:{port} failed: {e}")))?;
        Ok(Self {
            peer_id,
            stream: Some(stream),
        })
    }

    /// Wrap an already-accepted inbound stream.
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            peer_id: None,
            stream: Some(stream),
        }
    }

    pub fn peer_id(&self) -> Option<&str> {
        self.peer_id.as_deref()
    }

    /// Send one frame. Returns `false` if the connection is closed or the
    /// write failed; never panics or propagates the underlying error.
    pub async fn send(&mut self, msg_type: &str, payload: &str) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        match wire::write_frame(stream, msg_type, payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, msg_type, "send failed");
                false
            }
        }
    }

    /// Read one frame. Returns `None` on clean end-of-stream, a truncated
    /// frame, a malformed frame, or if the connection is already closed.
    pub async fn recv(&mut self) -> Option<(String, String)> {
        let stream = self.stream.as_mut()?;
        match wire::read_frame(stream).await {
            Ok(Some(frame)) => Some(frame),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(error = %e, "recv failed");
                None
            }
        }
    }

    pub fn close(&mut self) {
        self.stream = None;
    }
}

/// Dial `host:port`, send one frame, optionally drain replies until the
/// remote side closes, then close. Used by the bootstrap crawl, the
/// stabilizer's liveness probe, and `QUER`/`RESP` fan-out — every place the
/// original implementation's `connectandsend` helper was used.
pub async fn connect_and_send(
    host: &str,
    port: u16,
    msg_type: &str,
    payload: &str,
    wait_reply: bool,
) -> Vec<(String, String)> {
    let mut replies = Vec::new();

    let mut conn = match PeerConnection::connect(None, host, port).await {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, host, port, "connect_and_send: connect failed");
            return replies;
        }
    };

    if !conn.send(msg_type, payload).await {
        conn.close();
        return replies;
    }

    if wait_reply {
        while let Some(reply) = conn.recv().await {
            replies.push(reply);
        }
    }

    conn.close();
    replies
}
