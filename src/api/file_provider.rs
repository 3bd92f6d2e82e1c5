//! Implements the `Provider` trait by reading exported payload files from disk.
//!
//! The upstream scraping client is a separate program; it drops `accounts.json`,
//! `categories.json` and `transactions.csv` into an export directory, and this
//! implementation is the boundary between that directory and the pipeline.

use crate::api::Provider;
use crate::model::{RawAccounts, RawCategories};
use crate::Result;
use anyhow::Context;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const ACCOUNTS_JSON: &str = "accounts.json";
const CATEGORIES_JSON: &str = "categories.json";
const TRANSACTIONS_CSV: &str = "transactions.csv";

/// Reads provider payloads from an export directory.
pub struct FileProvider {
    export_dir: PathBuf,
    /// Set once the export directory has been validated for this session.
    opened: bool,
}

impl FileProvider {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            opened: false,
        }
    }

    /// Validates the export directory on the first fetch of a session. A real remote
    /// provider would authenticate here instead.
    fn open_session(&mut self) -> Result<()> {
        if self.opened {
            return Ok(());
        }
        if !self.export_dir.is_dir() {
            anyhow::bail!(
                "The export directory '{}' does not exist, run your provider export first",
                self.export_dir.display()
            );
        }
        debug!("Opened a provider session on '{}'", self.export_dir.display());
        self.opened = true;
        Ok(())
    }

    async fn read(&mut self, file_name: &str) -> Result<Vec<u8>> {
        self.open_session()?;
        let path = self.export_dir.join(file_name);
        fs::read(&path)
            .await
            .with_context(|| format!("Unable to read the provider export '{}'", path.display()))
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }
}

#[async_trait::async_trait]
impl Provider for FileProvider {
    async fn get_accounts(&mut self) -> Result<RawAccounts> {
        let bytes = self.read(ACCOUNTS_JSON).await?;
        serde_json::from_slice(&bytes).context("Unable to parse the accounts export")
    }

    async fn get_categories(&mut self) -> Result<RawCategories> {
        let bytes = self.read(CATEGORIES_JSON).await?;
        serde_json::from_slice(&bytes).context("Unable to parse the categories export")
    }

    async fn get_transactions_csv(&mut self) -> Result<Vec<u8>> {
        self.read(TRANSACTIONS_CSV).await
    }

    async fn close(&mut self) {
        if self.opened {
            debug!("Closed the provider session");
        }
        self.opened = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_export_directory_is_a_provider_error() {
        let dir = TempDir::new().unwrap();
        let mut provider = FileProvider::new(dir.path().join("nope"));
        let err = provider.get_accounts().await.unwrap_err();
        assert!(err.to_string().contains("export directory"));
        provider.close().await;
    }

    #[tokio::test]
    async fn reads_exports_from_the_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(ACCOUNTS_JSON),
            r#"[{ "id": 1, "accountType": "bank", "fiName": "Bank", "accountName": "Checking",
                  "isActive": true, "value": 10.0 }]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join(TRANSACTIONS_CSV), b"Date,Description\n").unwrap();
        let mut provider = FileProvider::new(dir.path());
        let accounts = provider.get_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        let csv = provider.get_transactions_csv().await.unwrap();
        assert!(csv.starts_with(b"Date"));
        provider.close().await;
    }
}
