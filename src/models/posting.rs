//! Posting data structures.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// One row of a listing page, in presented (newest-first) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Author name (empty for anonymous postings)
    pub author: String,

    /// Posting title
    pub title: String,

    /// Raw date text, normalized later
    pub date_text: String,

    /// Absolute URL of the detail page
    pub detail_link: String,
}

/// A harvested posting ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingRecord {
    pub author: String,
    pub title: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
}

/// Storage schema of a posting.
///
/// `date` is ISO-8601 with an explicit `+00:00` offset,
/// e.g. `2024-03-05T13:45:00+00:00`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredPosting {
    #[serde(default)]
    pub author: String,
    pub title: String,
    pub content: String,
    pub date: String,
}

impl StoredPosting {
    /// Parse the stored date back into an instant.
    pub fn published_at(&self) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| AppError::storage(format!("bad stored date '{}': {e}", self.date)))
    }
}

/// Canonical string form of an instant in the history.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

impl From<&PostingRecord> for StoredPosting {
    fn from(record: &PostingRecord) -> Self {
        Self {
            author: record.author.clone(),
            title: record.title.clone(),
            content: record.content.clone(),
            date: format_instant(&record.published_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> PostingRecord {
        PostingRecord {
            author: String::new(),
            title: "Untitled".to_string(),
            content: "line one\nline two".to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 3, 5, 13, 45, 0).unwrap(),
        }
    }

    #[test]
    fn test_stored_date_has_explicit_offset() {
        let stored = StoredPosting::from(&sample_record());
        assert_eq!(stored.date, "2024-03-05T13:45:00+00:00");
    }

    #[test]
    fn test_stored_date_parses_back() {
        let record = sample_record();
        let stored = StoredPosting::from(&record);
        assert_eq!(stored.published_at().unwrap(), record.published_at);
    }

    #[test]
    fn test_bad_stored_date_is_storage_error() {
        let stored = StoredPosting {
            author: String::new(),
            title: "t".to_string(),
            content: "c".to_string(),
            date: "05 Mar 2024".to_string(),
        };
        assert!(matches!(
            stored.published_at(),
            Err(AppError::Storage(_))
        ));
    }
}
