//! Common test utilities and fixtures
//!
//! Shared infrastructure for the `meshml-node` integration test suites.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// A command bound to the `meshml-node` binary.
pub fn node_cmd() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("meshml-node").unwrap()
}

/// A temp directory holding a node configuration file, plus paths for an
/// optional bundled model and log file. Used across the CLI, config, and
/// end-to-end test suites.
pub struct ConfigFixture {
    #[allow(dead_code)]
    temp_dir: TempDir,
    pub config_path: PathBuf,
    pub model_path: PathBuf,
    pub log_path: PathBuf,
}

impl ConfigFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let root = temp_dir.path();

        Self {
            config_path: root.join("config.toml"),
            model_path: root.join("model.json"),
            log_path: root.join("node.log"),
            temp_dir,
        }
    }

    /// Create a fixture and immediately write `content` as its config file.
    pub fn with_config(content: &str) -> Self {
        let fixture = Self::new();
        fixture.write_config(content);
        fixture
    }

    pub fn write_config(&self, content: &str) {
        fs::write(&self.config_path, content).expect("failed to write config");
    }

    pub fn path(&self) -> &str {
        self.config_path.to_str().unwrap()
    }

    /// Write a minimal linear-model JSON fixture and return its path.
    pub fn create_mock_model(&self, weights: &[f64], bias: f64) -> PathBuf {
        let body = format!(r#"{{"weights": {:?}, "bias": {}}}"#, weights, bias);
        fs::write(&self.model_path, body).expect("failed to write mock model");
        self.model_path.clone()
    }
}

impl Default for ConfigFixture {
    fn default() -> Self {
        Self::new()
    }
}
