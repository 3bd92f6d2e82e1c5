//! The fetch-and-cache pipeline.
//!
//! Three raw payloads come from the provider (`accounts_raw`, `categories_raw`,
//! `transactions_csv_raw`) and three processed datasets are derived from them
//! (`accounts_dp`, `categories_dp`, `transactions_dp`). Every stage is cached: a request
//! first purges stale entries, then checks the processed cache, and only on a miss walks
//! down to the raw cache and, as a last resort, the provider. The transactions dataset
//! depends on the categories dataset (for the parent map and the budget-group mapping),
//! and resolves it through the same processed-cache path so a fresh cached copy is reused.
//!
//! Cache-layer failures never surface: a missing, unreadable, corrupt, or
//! schema-outdated entry is a miss. Provider, transform, and budget-configuration
//! failures propagate to the caller, and nothing is cached for a stage that failed.

use crate::api::Provider;
use crate::budget::{BudgetGroups, BudgetsFile};
use crate::cache::CacheStore;
use crate::model::{
    AccountsData, CategoriesData, RawAccounts, RawCategories, TransactionsData, Versioned,
};
use crate::{Config, Result};
use anyhow::bail;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use tracing::debug;

const ACCOUNTS_RAW: &str = "accounts_raw";
const CATEGORIES_RAW: &str = "categories_raw";
const TRANSACTIONS_CSV_RAW: &str = "transactions_csv_raw";
const ACCOUNTS_DP: &str = "accounts_dp";
const CATEGORIES_DP: &str = "categories_dp";
const TRANSACTIONS_DP: &str = "transactions_dp";

const JSON: &str = "json";
const CSV: &str = "csv";

/// The processed datasets a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Accounts,
    Categories,
    Transactions,
}

impl Display for DatasetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetKind::Accounts => write!(f, "accounts"),
            DatasetKind::Categories => write!(f, "categories"),
            DatasetKind::Transactions => write!(f, "transactions"),
        }
    }
}

/// A processed dataset returned from a pipeline request.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Accounts(AccountsData),
    Categories(CategoriesData),
    Transactions(TransactionsData),
}

impl Dataset {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Dataset::Accounts(_) => DatasetKind::Accounts,
            Dataset::Categories(_) => DatasetKind::Categories,
            Dataset::Transactions(_) => DatasetKind::Transactions,
        }
    }

    pub fn into_accounts(self) -> Result<AccountsData> {
        match self {
            Dataset::Accounts(data) => Ok(data),
            other => bail!("Expected the accounts dataset, got {}", other.kind()),
        }
    }

    pub fn into_categories(self) -> Result<CategoriesData> {
        match self {
            Dataset::Categories(data) => Ok(data),
            other => bail!("Expected the categories dataset, got {}", other.kind()),
        }
    }

    pub fn into_transactions(self) -> Result<TransactionsData> {
        match self {
            Dataset::Transactions(data) => Ok(data),
            other => bail!("Expected the transactions dataset, got {}", other.kind()),
        }
    }
}

/// Runs the purge, fetch, transform, cache chain for one request at a time.
pub struct Fetcher {
    cache: CacheStore,
    budgets_path: PathBuf,
    provider: Box<dyn Provider + Send>,
}

impl Fetcher {
    /// Creates a `Fetcher` over the configured cache store and budgets file, using
    /// `provider` for anything the cache cannot answer.
    pub async fn new(config: &Config, provider: Box<dyn Provider + Send>) -> Result<Self> {
        Ok(Self {
            cache: config.cache_store().await?,
            budgets_path: config.budgets_path(),
            provider,
        })
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Serves one external request for a processed dataset.
    ///
    /// Stale cache entries are purged exactly once, before anything else, and the provider
    /// session is released when the request finishes whether or not it succeeded. Internal
    /// dependency resolution (transactions needing categories) does not purge again.
    pub async fn request(&mut self, kind: DatasetKind) -> Result<Dataset> {
        self.cache.purge().await?;
        let result = match kind {
            DatasetKind::Accounts => self.accounts().await.map(Dataset::Accounts),
            DatasetKind::Categories => self.categories().await.map(Dataset::Categories),
            DatasetKind::Transactions => self.transactions().await.map(Dataset::Transactions),
        };
        self.provider.close().await;
        result
    }

    async fn accounts(&mut self) -> Result<AccountsData> {
        if let Some(data) = self.cached_derived::<AccountsData>(ACCOUNTS_DP).await {
            return Ok(data);
        }
        let raw = self.raw_accounts().await?;
        let data = AccountsData::process(&raw)?;
        self.put_derived(ACCOUNTS_DP, &data).await?;
        Ok(data)
    }

    async fn categories(&mut self) -> Result<CategoriesData> {
        if let Some(data) = self.cached_derived::<CategoriesData>(CATEGORIES_DP).await {
            return Ok(data);
        }
        let raw = self.raw_categories().await?;
        let data = CategoriesData::process(&raw)?;
        self.put_derived(CATEGORIES_DP, &data).await?;
        Ok(data)
    }

    async fn transactions(&mut self) -> Result<TransactionsData> {
        if let Some(data) = self.cached_derived::<TransactionsData>(TRANSACTIONS_DP).await {
            return Ok(data);
        }
        // One categories build serves both the parent map and the budget-group validation.
        let categories = self.categories().await?;
        let parents = categories.parent_map();
        // The budget mapping is rebuilt on every miss rather than cached: it is cheap, and
        // edits to the budgets file must not wait out the cache TTL.
        let budgets = BudgetsFile::load(&self.budgets_path).await?;
        let budget_groups = BudgetGroups::new(&budgets, &parents)?;
        let raw_csv = self.raw_transactions_csv().await?;
        let data = TransactionsData::process(&raw_csv, &parents, budget_groups.budget_parents())?;
        self.put_derived(TRANSACTIONS_DP, &data).await?;
        Ok(data)
    }

    async fn raw_accounts(&mut self) -> Result<RawAccounts> {
        if let Some(raw) = self.cached_raw::<RawAccounts>(ACCOUNTS_RAW).await {
            return Ok(raw);
        }
        let raw = self.provider.get_accounts().await?;
        self.cache.put(ACCOUNTS_RAW, JSON, &serde_json::to_vec(&raw)?).await?;
        Ok(raw)
    }

    async fn raw_categories(&mut self) -> Result<RawCategories> {
        if let Some(raw) = self.cached_raw::<RawCategories>(CATEGORIES_RAW).await {
            return Ok(raw);
        }
        let raw = self.provider.get_categories().await?;
        self.cache.put(CATEGORIES_RAW, JSON, &serde_json::to_vec(&raw)?).await?;
        Ok(raw)
    }

    async fn raw_transactions_csv(&mut self) -> Result<Vec<u8>> {
        if let Some(bytes) = self.cache.get_latest(TRANSACTIONS_CSV_RAW).await {
            debug!("Cache hit for '{TRANSACTIONS_CSV_RAW}'");
            return Ok(bytes);
        }
        let bytes = self.provider.get_transactions_csv().await?;
        self.cache.put(TRANSACTIONS_CSV_RAW, CSV, &bytes).await?;
        Ok(bytes)
    }

    /// Reads a cached raw payload. Any decode failure is a miss that falls through to the
    /// provider.
    async fn cached_raw<T>(&self, prefix: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self.cache.get_latest(prefix).await?;
        match serde_json::from_slice::<T>(&bytes) {
            Ok(raw) => {
                debug!("Cache hit for '{prefix}'");
                Some(raw)
            }
            Err(e) => {
                debug!("Corrupt cache entry for '{prefix}', refetching: {e}");
                None
            }
        }
    }

    /// Reads a cached processed dataset. Decode failures and schema-version mismatches are
    /// both clean misses that trigger a rebuild.
    async fn cached_derived<T>(&self, prefix: &str) -> Option<T>
    where
        T: DeserializeOwned + Versioned,
    {
        let bytes = self.cache.get_latest(prefix).await?;
        match serde_json::from_slice::<T>(&bytes) {
            Ok(data) if data.is_current_schema() => {
                debug!("Cache hit for '{prefix}'");
                Some(data)
            }
            Ok(data) => {
                debug!(
                    "Cached '{prefix}' entry has schema version {} but the current version is {}, rebuilding",
                    data.schema_version(),
                    T::CURRENT_SCHEMA
                );
                None
            }
            Err(e) => {
                debug!("Corrupt cache entry for '{prefix}', rebuilding: {e}");
                None
            }
        }
    }

    /// Caches a processed dataset. Only called after its transform fully succeeded.
    async fn put_derived<T>(&self, prefix: &str, data: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.cache.put(prefix, JSON, &serde_json::to_vec(data)?).await?;
        Ok(())
    }
}
