//! meshml-node — peer-to-peer mesh node for distributed model inference
//!
//! Parses the CLI, resolves configuration, wires a [`meshml::Node`]
//! together, and runs it until interrupted.

mod cli;
mod config;
mod logging;
mod version;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use meshml::error::{Error, Result};
use meshml::node::NodeBuilder;
use meshml::predictor::{load_from_path, LinearModel};

use cli::{Cli, Commands, ConfigSubcommand};
use config::NodeConfig;

fn main() {
    if let Err(e) = run() {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN).ok();
            return handle_config_command(subcommand.clone());
        }
        Commands::Run { .. } => {}
    }

    let Commands::Run {
        config: config_path,
        port,
        host,
        id,
        max_peers,
        seed,
    } = cli.command
    else {
        unreachable!("Version and Config were already handled above");
    };

    let mut node_config = NodeConfig::load(config_path.as_deref())?;
    apply_cli_overrides(&mut node_config, port, host, id, max_peers, seed.as_deref())?;

    let _log_guards = logging::init_logging(&node_config.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    tracing::info!(version = %build.full_version(), target = %build.target, "starting meshml node");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("meshml-node")
        .build()
        .map_err(|e| Error::internal(format!("failed to create async runtime: {e}")))?;

    runtime.block_on(async_node_main(node_config))
}

/// Merge CLI-supplied overrides onto a loaded configuration. CLI flags win
/// over whatever the file/environment layers already decided.
fn apply_cli_overrides(
    config: &mut NodeConfig,
    port: Option<u16>,
    host: Option<String>,
    id: Option<String>,
    max_peers: Option<usize>,
    seed: Option<&str>,
) -> Result<()> {
    if let Some(port) = port {
        config.server_port = port;
    }
    if let Some(host) = host {
        config.server_host = Some(host);
    }
    if let Some(id) = id {
        config.my_id = Some(id);
    }
    if let Some(max_peers) = max_peers {
        config.max_peers = max_peers;
    }
    if let Some(seed) = seed {
        let (host, port, hops) = cli::parse_seed(seed)
            .ok_or_else(|| Error::config_field_invalid("seed", format!("malformed seed {seed:?}, expected host:port:hops")))?;
        config.seed = Some(config::SeedConfig { host, port, hops });
    }
    Ok(())
}

async fn async_node_main(config: NodeConfig) -> Result<()> {
    let mut builder = NodeBuilder::new(config.max_peers, config.server_port);
    if let Some(ref host) = config.server_host {
        builder = builder.server_host(host.clone());
    }
    if let Some(ref id) = config.my_id {
        builder = builder.my_id(id.clone());
    }
    let node = builder.build().await?;
    tracing::info!(peer_id = %node.self_id(), host = %node.self_host(), port = node.self_port(), "node constructed");

    if let (Some(model_name), Some(model_path)) = (&config.model_name, &config.model_path) {
        match load_from_path(model_path) {
            Ok(model) => {
                node.load(model_name.clone(), Arc::new(model) as Arc<dyn meshml::Predictor>);
                tracing::info!(model = %model_name, path = %model_path, "loaded reference model");
            }
            Err(e) => tracing::warn!(error = %e, "failed to load configured model"),
        }
    }

    node.start().await?;

    if let Some(seed) = &config.seed {
        node.bootstrap(seed.host.clone(), seed.port, seed.hops).await;
    }

    let _stabilizer = node.start_stabilizer(Duration::from_secs(config.stabilizer_interval_secs));

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::internal(format!("failed to listen for shutdown signal: {e}")))?;
    tracing::info!("shutdown signal received");
    node.shutdown();

    Ok(())
}

fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let loaded = NodeConfig::load(config.as_deref())?;
            let toml_str = toml::to_string_pretty(&loaded)?;
            println!("{toml_str}");
            Ok(())
        }
        ConfigSubcommand::Init { path, force } => {
            let path = match path {
                Some(p) => std::path::PathBuf::from(p),
                None => config::default_config_path(),
            };
            let written = config::init_config(&path, force)?;
            println!("Wrote default configuration to {}", written.display());
            Ok(())
        }
        ConfigSubcommand::Validate { config } => match NodeConfig::load(config.as_deref()) {
            Ok(_) => {
                println!("Configuration is valid");
                Ok(())
            }
            Err(e) => {
                eprint!("{}", e.format_for_terminal());
                std::process::exit(e.exit_code());
            }
        },
    }
}
