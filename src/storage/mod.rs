//! Storage abstractions for the harvested history.
//!
//! The history is append-only and keyed by each posting's publication instant.
//! Two postings published in the same second are indistinguishable to it.
//!
//! ## Backends
//!
//! - [`LocalStorage`]: a JSON document on disk, laid out like a TinyDB
//!   `db.json` so histories written by earlier tooling stay readable.
//! - [`MemoryStorage`]: process-local, for tests and dry runs.

pub mod local;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::PostingRecord;

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Trait for posting history backends.
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Append one record.
    async fn insert(&self, record: &PostingRecord) -> Result<()>;

    /// Append a page's records as one unit.
    ///
    /// Backends that write durably should override this to write once.
    async fn insert_batch(&self, records: &[PostingRecord]) -> Result<usize> {
        for record in records {
            self.insert(record).await?;
        }
        Ok(records.len())
    }

    /// Whether a posting published at `published_at` is already stored.
    async fn exists_by_date(&self, published_at: DateTime<Utc>) -> Result<bool>;

    /// Number of stored postings.
    async fn count(&self) -> Result<usize>;

    /// Remove every stored posting.
    async fn purge(&self) -> Result<()>;
}
