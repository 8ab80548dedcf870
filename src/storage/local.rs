//! Local filesystem storage implementation.
//!
//! The whole history lives in one JSON document:
//!
//! ```text
//! {
//!   "_default": {
//!     "1": { "author": "", "title": "...", "content": "...", "date": "2024-03-05T13:45:00+00:00" },
//!     "2": { ... }
//!   }
//! }
//! ```
//!
//! Document ids are decimal strings, assigned in insertion order. The file is
//! read once on open and rewritten atomically (write to temp, then rename) on
//! every mutation.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{PostingRecord, StoredPosting};
use crate::storage::PostingStore;

/// On-disk layout: one table of documents keyed by id.
#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(rename = "_default", default)]
    table: BTreeMap<String, StoredPosting>,
}

struct State {
    file: HistoryFile,
    dates: HashSet<DateTime<Utc>>,
    next_id: u64,
}

impl State {
    fn from_file(file: HistoryFile) -> Self {
        let mut dates = HashSet::with_capacity(file.table.len());
        let mut last_id = 0;
        for (id, posting) in &file.table {
            match posting.published_at() {
                Ok(date) => {
                    dates.insert(date);
                }
                Err(e) => log::warn!("Ignoring document {id} in date index: {e}"),
            }
            if let Ok(n) = id.parse::<u64>() {
                last_id = last_id.max(n);
            }
        }
        Self {
            file,
            dates,
            next_id: last_id + 1,
        }
    }

    /// Append a record, returning whether its date was new to the index.
    fn push(&mut self, record: &PostingRecord) -> bool {
        self.file
            .table
            .insert(self.next_id.to_string(), StoredPosting::from(record));
        self.next_id += 1;
        self.dates.insert(record.published_at)
    }

    /// Undo the last `count` pushes.
    fn rollback(&mut self, count: usize, new_dates: &[DateTime<Utc>]) {
        for _ in 0..count {
            self.next_id -= 1;
            self.file.table.remove(&self.next_id.to_string());
        }
        for date in new_dates {
            self.dates.remove(date);
        }
    }
}

/// JSON-file backed history.
pub struct LocalStorage {
    path: PathBuf,
    state: Mutex<State>,
}

impl LocalStorage {
    /// Open the history at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => HistoryFile::default(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::storage(format!("{} is not a valid history: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No history at {}, starting empty", path.display());
                HistoryFile::default()
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        Ok(Self {
            path,
            state: Mutex::new(State::from_file(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the document atomically.
    async fn persist(&self, file: &HistoryFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec(file)?;
        let tmp = self.path.with_extension("tmp");
        let mut out = tokio::fs::File::create(&tmp).await?;
        out.write_all(&bytes).await?;
        out.flush().await?;
        drop(out);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PostingStore for LocalStorage {
    async fn insert(&self, record: &PostingRecord) -> Result<()> {
        self.insert_batch(std::slice::from_ref(record)).await?;
        Ok(())
    }

    async fn insert_batch(&self, records: &[PostingRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut state = self.state.lock().await;
        let mut new_dates = Vec::new();
        for record in records {
            if state.push(record) {
                new_dates.push(record.published_at);
            }
        }

        // The batch is only kept in memory once it is on disk.
        if let Err(e) = self.persist(&state.file).await {
            state.rollback(records.len(), &new_dates);
            return Err(e);
        }

        log::debug!("Stored {} postings in {}", records.len(), self.path.display());
        Ok(records.len())
    }

    async fn exists_by_date(&self, published_at: DateTime<Utc>) -> Result<bool> {
        Ok(self.state.lock().await.dates.contains(&published_at))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.lock().await.file.table.len())
    }

    async fn purge(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let empty = HistoryFile::default();
        self.persist(&empty).await?;
        *state = State::from_file(empty);
        Ok(())
    }
}
