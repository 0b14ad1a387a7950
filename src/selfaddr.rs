//! Self-address discovery
//!
//! When no explicit host is configured, a node needs some way to learn
//! which address to advertise to peers. The original implementation did
//! this by dialing `www.google.com:80` and reading back the local end of
//! that socket — a trick that works because it forces the OS to pick a
//! real outbound route and source address instead of an ambiguous
//! `0.0.0.0`. We keep the same trick.

use tokio::net::TcpStream;

use crate::error::{Error, Result};

/// The external host dialed purely to force outbound route selection. No
/// data is sent or received; the connection is dropped immediately.
const DISCOVERY_PROBE_HOST: &str = "www.google.com:80";

/// Discover this node's outbound IP address.
pub async fn discover_self_host() -> Result<String> {
    let stream = TcpStream::connect(DISCOVERY_PROBE_HOST)
        .await
        .map_err(|e| Error::address_discovery(format!("failed to dial {DISCOVERY_PROBE_HOST}: {e}")))?;
    let local_addr = stream
        .local_addr()
        .map_err(|e| Error::address_discovery(format!("failed to read local socket address: {e}")))?;
    Ok(local_addr.ip().to_string())
}
