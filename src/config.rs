//! Configuration loading: CLI > environment > file > defaults
//!
//! Reads a TOML file if one is found, applies `MESHML_*` environment
//! overrides on top, expands any `~`-relative paths, then validates the
//! result. CLI overrides are applied by the caller after `load()` returns,
//! since they take precedence over everything else.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use meshml::error::{Error, Result};

/// Top-level node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Maximum number of directly-known peers. 0 means unbounded.
    pub max_peers: usize,
    /// Port this node listens on.
    pub server_port: u16,
    /// Explicit host to advertise. When unset, discovered at startup.
    pub server_host: Option<String>,
    /// Explicit peer id. When unset, derived from host:port.
    pub my_id: Option<String>,
    /// Seed peer to bootstrap from, if any.
    pub seed: Option<SeedConfig>,
    /// Interval between stabilizer passes.
    pub stabilizer_interval_secs: u64,
    /// Name under which to register the bundled reference model, if loaded.
    pub model_name: Option<String>,
    /// Path to a JSON model file for the bundled reference predictor.
    pub model_path: Option<String>,
    pub logging: LoggingSettings,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            max_peers: 32,
            server_port: 9000,
            server_host: None,
            my_id: None,
            seed: None,
            stabilizer_interval_secs: 30,
            model_name: None,
            model_path: None,
            logging: LoggingSettings::default(),
        }
    }
}

/// A peer to bootstrap from at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub host: String,
    pub port: u16,
    pub hops: u32,
}

/// Logging configuration, passed straight through to [`crate::logging`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<String>,
    pub json_format: bool,
    pub max_file_size_mb: u64,
    pub max_files: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json_format: false,
            max_file_size_mb: 100,
            max_files: 7,
        }
    }
}

impl NodeConfig {
    /// Load configuration: explicit path (or a discovered default file) as
    /// the base, environment variables layered on top, paths expanded,
    /// then validated.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = match find_config_file(config_path) {
            Some(path) => {
                let contents = std::fs::read_to_string(&path).map_err(|e| Error::IoRead {
                    path: path.clone(),
                    source: e,
                })?;
                toml::from_str(&contents).map_err(|e| Error::ConfigParse {
                    message: format!("in {}: {}", path.display(), e),
                    source: Some(e),
                })?
            }
            None => {
                if let Some(explicit) = config_path {
                    return Err(Error::config_not_found(explicit));
                }
                NodeConfig::default()
            }
        };

        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("MESHML_MAX_PEERS") {
            if let Ok(n) = v.parse() {
                self.max_peers = n;
            }
        }
        if let Ok(v) = env::var("MESHML_SERVER_PORT") {
            if let Ok(n) = v.parse() {
                self.server_port = n;
            }
        }
        if let Ok(v) = env::var("MESHML_SERVER_HOST") {
            self.server_host = Some(v);
        }
        if let Ok(v) = env::var("MESHML_MY_ID") {
            self.my_id = Some(v);
        }
        if let Ok(v) = env::var("MESHML_STABILIZER_INTERVAL_SECS") {
            if let Ok(n) = v.parse() {
                self.stabilizer_interval_secs = n;
            }
        }
        if let Ok(v) = env::var("MESHML_MODEL_NAME") {
            self.model_name = Some(v);
        }
        if let Ok(v) = env::var("MESHML_MODEL_PATH") {
            self.model_path = Some(v);
        }
        if let (Ok(host), Ok(port)) = (env::var("MESHML_SEED_HOST"), env::var("MESHML_SEED_PORT")) {
            let hops = env::var("MESHML_SEED_HOPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);
            if let Ok(port) = port.parse() {
                self.seed = Some(SeedConfig { host, port, hops });
            }
        }
        if let Ok(v) = env::var("MESHML_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = env::var("MESHML_LOG_FILE") {
            self.logging.file = Some(v);
        }
        if let Ok(v) = env::var("MESHML_LOG_JSON") {
            self.logging.json_format = v == "true" || v == "1";
        }
    }

    fn expand_paths(&mut self) {
        if let Some(ref path) = self.model_path {
            self.model_path = Some(
                shellexpand::full(path)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| path.clone()),
            );
        }
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(
                shellexpand::full(file)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| file.clone()),
            );
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(ref seed) = self.seed {
            if seed.hops == 0 {
                return Err(Error::config_field_invalid(
                    "seed.hops",
                    "seed.hops must be at least 1",
                ));
            }
        }
        if self.model_path.is_some() && self.model_name.is_none() {
            return Err(Error::config_field_invalid(
                "model_name",
                "model_name is required when model_path is set",
            ));
        }
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "warning" | "error" => {}
            other => {
                return Err(Error::config_field_invalid(
                    "logging.level",
                    format!("invalid log level: {other}"),
                ))
            }
        }
        Ok(())
    }
}

/// Resolve which config file to load: an explicit path, or the first of a
/// small list of conventional locations.
fn find_config_file(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        let path = PathBuf::from(path);
        return path.exists().then_some(path);
    }

    let mut candidates = vec![PathBuf::from("meshml.toml"), PathBuf::from("node.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("meshml").join("node.toml"));
    }
    if let Some(home_dir) = dirs::home_dir() {
        candidates.push(home_dir.join(".meshml").join("node.toml"));
    }
    candidates.push(PathBuf::from("/etc/meshml/node.toml"));

    candidates.into_iter().find(|p| p.exists())
}

/// Path used by `config init` when none is given.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("meshml")
        .join("node.toml")
}

/// Write a commented default configuration file to `path`.
pub fn init_config(path: &Path, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        return Err(Error::config_validation(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(path.to_path_buf())
}

fn generate_default_config() -> String {
    r#"# meshml node configuration
#
# Every field below is optional; omitted fields take the defaults shown
# here. CLI flags take precedence over this file, and MESHML_* environment
# variables take precedence over CLI flags that weren't explicitly given.

# Maximum number of directly-known peers. 0 means unbounded.
max_peers = 32

# Port this node listens on.
server_port = 9000

# Explicit host to advertise to peers. If omitted, this node discovers its
# own outbound address at startup.
# server_host = "203.0.113.10"

# Explicit peer id. If omitted, derived as "<host>:<port>".
# my_id = "node-a"

# Uncomment to bootstrap from a seed peer at startup.
# [seed]
# host = "203.0.113.20"
# port = 9000
# hops = 2

# How often the stabilizer checks known peers for liveness, in seconds.
stabilizer_interval_secs = 30

# Uncomment to load the bundled reference linear-model predictor at startup.
# model_name = "sentiment"
# model_path = "~/models/sentiment.json"

[logging]
level = "info"
json_format = false
max_file_size_mb = 100
max_files = 7
# file = "~/.local/share/meshml/node.log"
"#
    .to_string()
}
