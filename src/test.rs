//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::Config;
use tempfile::TempDir;

/// Test environment that sets up a mintpipe home directory with a default configuration,
/// cache directory, and the sample budgets file. Holds the `TempDir` to keep the directory
/// alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a fresh home directory with `Config::create`.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("mintpipe");
        let config = Config::create(&root).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Replaces the budgets file with `json`.
    pub fn write_budgets(&self, json: &str) {
        std::fs::write(self.config.budgets_path(), json).unwrap();
    }
}
