//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the meshml node.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "meshml-node")]
#[command(about = "Peer-to-peer mesh node for distributed model inference", long_about = None)]
pub struct Cli {
    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all but error-level logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node: bind the listener, optionally bootstrap, run the stabilizer
    Run {
        /// Path to a configuration file
        #[arg(short, long, env = "MESHML_CONFIG")]
        config: Option<String>,

        /// Override the listening port
        #[arg(long)]
        port: Option<u16>,

        /// Override the advertised host (skips self-address discovery)
        #[arg(long)]
        host: Option<String>,

        /// Override the peer id
        #[arg(long)]
        id: Option<String>,

        /// Override max peers (0 = unbounded)
        #[arg(long)]
        max_peers: Option<usize>,

        /// Bootstrap from a seed peer, formatted "host:port:hops"
        #[arg(long)]
        seed: Option<String>,
    },

    /// Print version and build information
    Version,

    /// Configuration file management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show {
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Write a default configuration file
    Init {
        /// Destination path; defaults to the platform config directory
        #[arg(short, long)]
        path: Option<String>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Validate a configuration file without starting the node
    Validate {
        #[arg(short, long)]
        config: Option<String>,
    },
}

/// Parse a "host:port:hops" bootstrap string.
pub fn parse_seed(seed: &str) -> Option<(String, u16, u32)> {
    let mut parts = seed.splitn(3, ':');
    let host = parts.next()?.to_string();
    let port: u16 = parts.next()?.parse().ok()?;
    let hops: u32 = parts.next()?.parse().ok()?;
    Some((host, port, hops))
}
