//! The upstream data provider boundary.
//!
//! Everything above this module treats the provider as three opaque fetches behind the
//! `Provider` trait. The production implementation reads exported payload files from disk;
//! the test implementation serves seeded in-memory data and counts calls.

mod file_provider;
mod test_provider;

use crate::model::{RawAccounts, RawCategories};
use crate::{Config, Result};

pub use file_provider::FileProvider;
pub use test_provider::{ProviderCalls, TestProvider};

/// A session with the upstream provider.
///
/// Sessions are scoped to one pipeline request: implementations acquire whatever they need
/// (auth, file handles) lazily on the first fetch, and the orchestrator calls `close`
/// unconditionally when the request finishes, whether or not a fetch failed.
#[async_trait::async_trait]
pub trait Provider {
    /// Fetches the raw accounts payload.
    async fn get_accounts(&mut self) -> Result<RawAccounts>;

    /// Fetches the raw categories payload.
    async fn get_categories(&mut self) -> Result<RawCategories>;

    /// Fetches the raw transactions CSV byte stream.
    async fn get_transactions_csv(&mut self) -> Result<Vec<u8>>;

    /// Releases the session. Must be safe to call even if no fetch ever happened.
    async fn close(&mut self);
}

/// Selects a `Provider` implementation at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Read exported payload files from the configured export directory.
    File,
    /// Serve seeded in-memory data without touching the filesystem exports.
    Test,
}

impl Mode {
    /// This allows for exercising the program without real export data. When
    /// `MINTPIPE_IN_TEST_MODE` is set and non-zero in length, then the mode will be
    /// `Mode::Test`, otherwise it will be `Mode::File`.
    pub fn from_env() -> Self {
        match std::env::var("MINTPIPE_IN_TEST_MODE") {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::File,
        }
    }
}

/// Creates the `Provider` implementation for `mode`.
pub fn provider(config: &Config, mode: Mode) -> Box<dyn Provider + Send> {
    match mode {
        Mode::File => Box::new(FileProvider::new(config.export_dir())),
        Mode::Test => Box::new(TestProvider::default()),
    }
}
