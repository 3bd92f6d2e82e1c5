//! Local cache of raw provider payloads and processed datasets.
//!
//! Every cache write creates a new file named `<prefix>_<YYYY>_<MM>_<DD>_<HH>_<MM>_<SS>.<ext>`
//! in the cache directory. Readers always take the newest entry for a prefix, so two racing
//! writes for the same prefix are harmless. Files whose names do not match the pattern are
//! ignored by both reads and purges.

use crate::Result;
use anyhow::Context;
use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// The timestamp portion of a cache file name, second resolution, local time.
const TIME_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// The number of characters produced by `TIME_FORMAT`.
const TIME_LEN: usize = 19;

/// Controls what `purge` deletes when cache entries pass their time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PurgePolicy {
    /// The cache has one global freshness clock: if the newest entry across the whole store
    /// is older than the TTL, every entry is deleted. Otherwise nothing is deleted, even
    /// entries that are individually older than the TTL.
    #[default]
    WholeStore,

    /// Each entry is deleted once its own age exceeds the TTL.
    PerEntry,
}

/// A directory of timestamped payload files with a time-to-live.
///
/// The store does not interpret payload bytes. Serialization and deserialization belong to
/// the caller, and a payload that fails to decode should be treated the same as a miss.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    ttl: Duration,
    policy: PurgePolicy,
}

impl CacheStore {
    /// Creates a store rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>, ttl_hours: i64, policy: PurgePolicy) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Unable to create the cache directory '{}'", dir.display()))?;
        Ok(Self {
            dir,
            ttl: Duration::hours(ttl_hours),
            policy,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn policy(&self) -> PurgePolicy {
        self.policy
    }

    /// Persists `payload` under a brand new entry for `prefix`. An existing entry is never
    /// overwritten: two writes within the same second get distinct timestamps.
    pub async fn put(&self, prefix: &str, ext: &str, payload: &[u8]) -> Result<PathBuf> {
        let mut stamp = Local::now().naive_local();
        let mut path = self.entry_path(prefix, ext, stamp);
        while path.exists() {
            stamp = stamp + Duration::seconds(1);
            path = self.entry_path(prefix, ext, stamp);
        }
        fs::write(&path, payload)
            .await
            .with_context(|| format!("Unable to write cache entry '{}'", path.display()))?;
        debug!("Cached {} bytes at '{}'", payload.len(), path.display());
        Ok(path)
    }

    /// Returns the payload of the newest entry for `prefix`, or `None` if there is no entry
    /// or the newest entry cannot be read. A failed read is a miss, never an error.
    pub async fn get_latest(&self, prefix: &str) -> Option<Vec<u8>> {
        let entries = self.entries().await.ok()?;
        let (_, path) = entries
            .into_iter()
            .filter(|(entry, _)| entry.prefix == prefix)
            .max_by(|(a, _), (b, _)| a.timestamp.cmp(&b.timestamp))?;
        match fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!("Treating unreadable cache entry '{}' as a miss: {e}", path.display());
                None
            }
        }
    }

    /// Deletes stale entries according to the configured `PurgePolicy`.
    pub async fn purge(&self) -> Result<()> {
        let now = Local::now().naive_local();
        let entries = self.entries().await?;
        match self.policy {
            PurgePolicy::WholeStore => {
                let newest = match entries.iter().map(|(e, _)| e.timestamp).max() {
                    Some(ts) => ts,
                    None => return Ok(()),
                };
                if now.signed_duration_since(newest) > self.ttl {
                    debug!("Newest cache entry is stale, deleting the whole store");
                    for (_, path) in entries {
                        remove(&path).await?;
                    }
                }
            }
            PurgePolicy::PerEntry => {
                for (entry, path) in entries {
                    if now.signed_duration_since(entry.timestamp) > self.ttl {
                        remove(&path).await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Deletes every cache entry regardless of age. Files that do not look like cache
    /// entries are left alone.
    pub async fn clear(&self) -> Result<usize> {
        let entries = self.entries().await?;
        let count = entries.len();
        for (_, path) in entries {
            remove(&path).await?;
        }
        Ok(count)
    }

    fn entry_path(&self, prefix: &str, ext: &str, stamp: NaiveDateTime) -> PathBuf {
        self.dir
            .join(format!("{prefix}_{}.{ext}", stamp.format(TIME_FORMAT)))
    }

    /// Lists every file in the cache directory whose name parses as a cache entry.
    async fn entries(&self) -> Result<Vec<(EntryName, PathBuf)>> {
        let mut read_dir = fs::read_dir(&self.dir).await.with_context(|| {
            format!("Unable to read the cache directory '{}'", self.dir.display())
        })?;
        let mut entries = Vec::new();
        while let Some(dir_entry) = read_dir.next_entry().await? {
            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(entry) = EntryName::parse(name) {
                entries.push((entry, dir_entry.path()));
            }
        }
        Ok(entries)
    }
}

async fn remove(path: &Path) -> Result<()> {
    fs::remove_file(path)
        .await
        .with_context(|| format!("Unable to delete cache entry '{}'", path.display()))
}

/// A parsed cache file name, `<prefix>_<timestamp>.<ext>`.
#[derive(Debug, Clone, Eq, PartialEq)]
struct EntryName {
    prefix: String,
    timestamp: NaiveDateTime,
}

impl EntryName {
    /// Returns `None` for any file name that does not match the entry pattern exactly.
    fn parse(name: &str) -> Option<Self> {
        let (stem, ext) = name.rsplit_once('.')?;
        if ext.is_empty() || stem.len() < TIME_LEN + 2 {
            return None;
        }
        let (prefix, time_part) = stem.split_at(stem.len() - TIME_LEN - 1);
        let time_part = time_part.strip_prefix('_')?;
        let timestamp = NaiveDateTime::parse_from_str(time_part, TIME_FORMAT).ok()?;
        if prefix.is_empty() {
            return None;
        }
        Some(Self {
            prefix: prefix.to_string(),
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store(dir: &TempDir, ttl_hours: i64, policy: PurgePolicy) -> CacheStore {
        CacheStore::new(dir.path(), ttl_hours, policy).await.unwrap()
    }

    /// Writes an entry whose embedded timestamp is `age_hours` in the past.
    fn write_aged_entry(dir: &TempDir, prefix: &str, ext: &str, age_hours: i64, payload: &[u8]) {
        let stamp = Local::now().naive_local() - Duration::hours(age_hours);
        let name = format!("{prefix}_{}.{ext}", stamp.format(TIME_FORMAT));
        std::fs::write(dir.path().join(name), payload).unwrap();
    }

    #[test]
    fn entry_name_round_trip() {
        let entry = EntryName::parse("accounts_raw_2024_03_09_18_30_05.json").unwrap();
        assert_eq!(entry.prefix, "accounts_raw");
        assert_eq!(
            entry.timestamp.format(TIME_FORMAT).to_string(),
            "2024_03_09_18_30_05"
        );
    }

    #[test]
    fn entry_name_rejects_strays() {
        assert!(EntryName::parse("README.md").is_none());
        assert!(EntryName::parse("accounts_raw.json").is_none());
        assert!(EntryName::parse("accounts_raw_2024_13_40_99_99_99.json").is_none());
        assert!(EntryName::parse("_2024_03_09_18_30_05.json").is_none());
        assert!(EntryName::parse("no_extension_2024_03_09_18_30_05").is_none());
    }

    #[tokio::test]
    async fn put_then_get_latest_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir, 6, PurgePolicy::WholeStore).await;
        cache.put("accounts_raw", "json", b"{\"a\":1}").await.unwrap();
        let first = cache.get_latest("accounts_raw").await.unwrap();
        let second = cache.get_latest("accounts_raw").await.unwrap();
        assert_eq!(first, b"{\"a\":1}");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn get_latest_returns_newest_entry() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir, 6, PurgePolicy::WholeStore).await;
        write_aged_entry(&dir, "accounts_raw", "json", 3, b"old");
        write_aged_entry(&dir, "accounts_raw", "json", 1, b"new");
        assert_eq!(cache.get_latest("accounts_raw").await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn get_latest_ignores_other_prefixes_and_strays() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir, 6, PurgePolicy::WholeStore).await;
        write_aged_entry(&dir, "categories_raw", "json", 1, b"categories");
        std::fs::write(dir.path().join("notes.txt"), b"stray").unwrap();
        assert!(cache.get_latest("accounts_raw").await.is_none());
        assert_eq!(cache.get_latest("categories_raw").await.unwrap(), b"categories");
    }

    #[tokio::test]
    async fn whole_store_purge_keeps_everything_while_newest_is_fresh() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir, 6, PurgePolicy::WholeStore).await;
        write_aged_entry(&dir, "transactions_csv_raw", "csv", 7, b"stale");
        write_aged_entry(&dir, "accounts_raw", "json", 2, b"fresh");
        cache.purge().await.unwrap();
        // The 7-hour-old entry survives because the newest entry in the store is fresh.
        assert_eq!(cache.get_latest("transactions_csv_raw").await.unwrap(), b"stale");
        assert_eq!(cache.get_latest("accounts_raw").await.unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn whole_store_purge_deletes_everything_once_newest_is_stale() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir, 6, PurgePolicy::WholeStore).await;
        write_aged_entry(&dir, "transactions_csv_raw", "csv", 7, b"stale");
        write_aged_entry(&dir, "accounts_raw", "json", 8, b"staler");
        cache.purge().await.unwrap();
        assert!(cache.get_latest("transactions_csv_raw").await.is_none());
        assert!(cache.get_latest("accounts_raw").await.is_none());
    }

    #[tokio::test]
    async fn per_entry_purge_deletes_only_stale_entries() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir, 6, PurgePolicy::PerEntry).await;
        write_aged_entry(&dir, "transactions_csv_raw", "csv", 7, b"stale");
        write_aged_entry(&dir, "accounts_raw", "json", 2, b"fresh");
        cache.purge().await.unwrap();
        assert!(cache.get_latest("transactions_csv_raw").await.is_none());
        assert_eq!(cache.get_latest("accounts_raw").await.unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn purge_leaves_stray_files_alone() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir, 6, PurgePolicy::PerEntry).await;
        write_aged_entry(&dir, "accounts_raw", "json", 10, b"stale");
        std::fs::write(dir.path().join("notes.txt"), b"stray").unwrap();
        cache.purge().await.unwrap();
        assert!(dir.path().join("notes.txt").exists());
        assert!(cache.get_latest("accounts_raw").await.is_none());
    }

    #[tokio::test]
    async fn clear_removes_entries_but_not_strays() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir, 6, PurgePolicy::WholeStore).await;
        write_aged_entry(&dir, "accounts_raw", "json", 1, b"a");
        write_aged_entry(&dir, "accounts_dp", "json", 1, b"b");
        std::fs::write(dir.path().join("notes.txt"), b"stray").unwrap();
        let removed = cache.clear().await.unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("notes.txt").exists());
        assert!(cache.get_latest("accounts_raw").await.is_none());
    }
}
