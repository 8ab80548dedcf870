//! In-memory storage implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::PostingRecord;
use crate::storage::PostingStore;

/// Process-local history. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: Vec<PostingRecord>,
    dates: HashSet<DateTime<Utc>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored records in insertion order.
    pub async fn records(&self) -> Vec<PostingRecord> {
        self.inner.lock().await.records.clone()
    }
}

#[async_trait]
impl PostingStore for MemoryStorage {
    async fn insert(&self, record: &PostingRecord) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.dates.insert(record.published_at);
        inner.records.push(record.clone());
        Ok(())
    }

    async fn exists_by_date(&self, published_at: DateTime<Utc>) -> Result<bool> {
        Ok(self.inner.lock().await.dates.contains(&published_at))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.lock().await.records.len())
    }

    async fn purge(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.records.clear();
        inner.dates.clear();
        Ok(())
    }
}
