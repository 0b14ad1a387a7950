//! meshml: an unstructured peer-to-peer overlay for distributed model
//! inference.
//!
//! A node keeps a small directory of directly-known neighbors, answers a
//! handful of fixed-format requests over plain TCP, and floods lookups for
//! models it doesn't host itself outward with a bounded TTL. There is no
//! central coordinator and no DHT — just a gossiping mesh, in the spirit of
//! the simplest peer-to-peer designs.

pub mod bootstrap;
pub mod connection;
pub mod directory;
pub mod error;
pub mod handler;
pub mod message;
pub mod node;
pub mod predictor;
pub mod registry;
pub mod router;
pub mod selfaddr;
pub mod server;
pub mod stabilizer;
pub mod wire;

pub use directory::{Endpoint, PeerDirectory, PeerId};
pub use error::{Error, Result};
pub use node::{Node, NodeBuilder};
pub use predictor::Predictor;
