//! Configuration file handling for mintpipe.
//!
//! The configuration file is stored at `$MINTPIPE_HOME/config.json` and contains settings
//! for the cache (time-to-live and purge policy) and the locations of the provider export
//! directory and the budgets file.

use crate::cache::{CacheStore, PurgePolicy};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "mintpipe";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const CACHE_DIR: &str = "cache";
const CONFIG_DIR: &str = "config";
const BUDGETS_JSON: &str = "budgets.json";
const EXPORTS_DIR: &str = "exports";

/// How long cache entries stay fresh, in hours.
const DEFAULT_CACHE_TTL_HOURS: i64 = 6;

/// The `Config` object represents the configuration of the app. You instantiate it by
/// providing the path to `$MINTPIPE_HOME` and from there it loads
/// `$MINTPIPE_HOME/config.json`. It provides paths to the cache directory, the provider
/// export directory, and the budgets file.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    cache_dir: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory and its subdirectories, writes an initial `config.json`
    /// with default settings, and writes a sample `config/budgets.json` if one does not
    /// already exist.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the mintpipe home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let cache_dir = root.join(CACHE_DIR);
        utils::make_dir(&cache_dir).await?;
        let config_dir = root.join(CONFIG_DIR);
        utils::make_dir(&config_dir).await?;
        utils::make_dir(&root.join(EXPORTS_DIR)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let budgets_path = config_dir.join(BUDGETS_JSON);
        if !budgets_path.is_file() {
            utils::write(&budgets_path, BUDGETS_TEMPLATE).await?;
        }

        Ok(Self {
            root,
            cache_dir,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the `mintpipe_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the cache directory exists
    /// - return the loaded configuration object
    pub async fn load(mintpipe_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = mintpipe_home.into();
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            root: root.clone(),
            cache_dir: root.join(CACHE_DIR),
            config_path,
            config_file,
        };
        if !config.cache_dir.is_dir() {
            bail!(
                "The cache directory is missing '{}'",
                config.cache_dir.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_ttl_hours(&self) -> i64 {
        self.config_file.cache_ttl_hours
    }

    pub fn purge_policy(&self) -> PurgePolicy {
        self.config_file.purge_policy
    }

    /// Returns the stored `export_dir` if it is absolute, otherwise resolves it against the
    /// home directory.
    pub fn export_dir(&self) -> PathBuf {
        self.resolve(
            self.config_file
                .export_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(EXPORTS_DIR)),
        )
    }

    /// Returns the stored `budgets_path` if it is absolute, otherwise resolves it against
    /// the home directory.
    pub fn budgets_path(&self) -> PathBuf {
        self.resolve(
            self.config_file
                .budgets_path
                .clone()
                .unwrap_or_else(|| Path::new(CONFIG_DIR).join(BUDGETS_JSON)),
        )
    }

    /// Creates the `CacheStore` described by this configuration.
    pub async fn cache_store(&self) -> Result<CacheStore> {
        CacheStore::new(
            &self.cache_dir,
            self.config_file.cache_ttl_hours,
            self.config_file.purge_policy,
        )
        .await
    }

    /// Checks if `p` is relative, and if so, resolves it. Returns it unchanged if it is
    /// absolute.
    fn resolve(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "mintpipe",
///   "config_version": 1,
///   "cache_ttl_hours": 6,
///   "purge_policy": "whole-store",
///   "export_dir": "exports",
///   "budgets_path": "config/budgets.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct ConfigFile {
    /// Application name, should always be "mintpipe"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// How long cache entries stay fresh, in hours. Applies uniformly to raw and processed
    /// entries.
    #[serde(default = "default_ttl")]
    cache_ttl_hours: i64,

    /// Whether a stale cache is purged per entry or as a whole store.
    #[serde(default)]
    purge_policy: PurgePolicy,

    /// Directory holding provider export files (optional, relative to the home directory
    /// or absolute). Defaults to $MINTPIPE_HOME/exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    export_dir: Option<PathBuf>,

    /// Path to the budgets file (optional, relative to the home directory or absolute).
    /// Defaults to $MINTPIPE_HOME/config/budgets.json.
    #[serde(skip_serializing_if = "Option::is_none")]
    budgets_path: Option<PathBuf>,
}

fn default_ttl() -> i64 {
    DEFAULT_CACHE_TTL_HOURS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
            purge_policy: PurgePolicy::default(),
            export_dir: None,
            budgets_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Unexpected app_name '{}' in '{}'",
            config.app_name,
            path.display()
        );
        anyhow::ensure!(
            config.cache_ttl_hours > 0,
            "cache_ttl_hours must be positive in '{}'",
            path.display()
        );
        Ok(config)
    }

    /// Saves the ConfigFile as pretty-printed JSON.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Unable to serialize the config")?;
        utils::write(path.as_ref(), json).await
    }
}

/// A starting budgets file. The groups and categories are samples, users are expected to
/// replace them with their own before the transactions dataset will validate.
const BUDGETS_TEMPLATE: &str = r#"{
  "Food": [600, ["Food & Dining", "Groceries", "Restaurants"]],
  "Transport": [200, ["Auto & Transport", "Gas & Fuel"]],
  "Income": [0, ["Income", "Paycheck"]]
}
"#;
