//! Persistent per-day action counters

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use crate::error::{Error, Result};

/// Map from `YYYY-MM-DD` keys to the number of actions taken that day
///
/// Serialized as a bare JSON object, e.g. `{"2026-10-19": 3}`. Keys are never
/// pruned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageRecord(BTreeMap<String, u32>);

impl UsageRecord {
    /// Count for `date`, 0 when the day has no entry
    pub fn count_for(&self, date: &str) -> u32 {
        self.0.get(date).copied().unwrap_or(0)
    }

    /// Add one action to `date`, creating the entry at 1. Returns the new count.
    pub fn increment(&mut self, date: &str) -> u32 {
        let count = self.0.entry(date.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Overwrite an existing entry. Days with no entry are left alone.
    pub fn reset_to(&mut self, date: &str, value: u32) -> bool {
        match self.0.get_mut(date) {
            Some(count) => {
                *count = value;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, date: &str) -> bool {
        self.0.contains_key(date)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(date, count)| (date.as_str(), *count))
    }
}

/// Storage backend for daily usage counters
///
/// Implementations must serialize `increment` and `reset_to` so that
/// concurrent callers never lose updates.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Every stored day. An absent backing store reads as empty.
    async fn load_all(&self) -> Result<UsageRecord>;

    /// Count for one day, 0 when absent
    async fn count_for(&self, date: &str) -> Result<u32> {
        Ok(self.load_all().await?.count_for(date))
    }

    /// Add one action to `date` and return the new count
    async fn increment(&self, date: &str) -> Result<u32>;

    /// Set `date` to `value` if the day already has an entry.
    ///
    /// Returns whether anything changed. A day that was never used stays
    /// absent (and so still reads as 0).
    async fn reset_to(&self, date: &str, value: u32) -> Result<bool>;
}

/// Usage store backed by a single JSON file
pub struct JsonFileUsageStore {
    path: PathBuf,
    /// Held across every read-modify-write of the file
    lock: Mutex<()>,
}

impl JsonFileUsageStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_record(&self) -> Result<UsageRecord> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(UsageRecord::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|source| Error::UsageCorrupted {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_record(&self, record: &UsageRecord) -> Result<()> {
        let json = serde_json::to_vec(record).map_err(Error::UsageEncode)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &json))
            .await
            .map_err(|e| Error::General(format!("usage writer task failed: {}", e)))?
    }
}

/// Write to a sibling temp file and rename it over `path`
fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    Ok(())
}

#[async_trait]
impl UsageStore for JsonFileUsageStore {
    async fn load_all(&self) -> Result<UsageRecord> {
        let _guard = self.lock.lock().await;
        self.read_record().await
    }

    async fn increment(&self, date: &str) -> Result<u32> {
        let _guard = self.lock.lock().await;

        let mut record = self.read_record().await?;
        let count = record.increment(date);
        self.write_record(&record).await?;

        Ok(count)
    }

    async fn reset_to(&self, date: &str, value: u32) -> Result<bool> {
        let _guard = self.lock.lock().await;

        let mut record = self.read_record().await?;
        if !record.reset_to(date, value) {
            return Ok(false);
        }
        self.write_record(&record).await?;

        Ok(true)
    }
}

/// Process-local usage store; counts are lost on restart
#[derive(Default)]
pub struct MemoryUsageStore {
    record: Mutex<UsageRecord>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing record
    pub fn with_record(record: UsageRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn load_all(&self) -> Result<UsageRecord> {
        Ok(self.record.lock().await.clone())
    }

    async fn increment(&self, date: &str) -> Result<u32> {
        Ok(self.record.lock().await.increment(date))
    }

    async fn reset_to(&self, date: &str, value: u32) -> Result<bool> {
        Ok(self.record.lock().await.reset_to(date, value))
    }
}
