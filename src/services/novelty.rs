//! Per-page novelty detection.
//!
//! Listings are ordered newest-first, so the first row whose date is already
//! in the history marks the boundary: it and everything after it are known.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::services::dates;
use crate::storage::PostingStore;

/// Verdict for one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Novelty {
    /// Rows before the first known one (all rows if none is known)
    pub novel_count: usize,
    /// Whether a known row was found, i.e. traversal should end here
    pub stop: bool,
    /// Normalized date of each of the first `novel_count` rows; `None`
    /// where the date text could not be parsed
    pub dates: Vec<Option<DateTime<Utc>>>,
}

impl Novelty {
    /// Rows whose date text was rejected.
    pub fn rejected(&self) -> usize {
        self.dates.iter().filter(|d| d.is_none()).count()
    }
}

/// Scan `date_texts` in presented order against `history`.
///
/// An unparseable date is logged and left out; it neither counts as known nor
/// ends the scan.
pub async fn filter_novel(date_texts: &[String], history: &dyn PostingStore) -> Result<Novelty> {
    let mut dates = Vec::with_capacity(date_texts.len());

    for raw in date_texts {
        match dates::normalize(raw) {
            Ok(published_at) => {
                if history.exists_by_date(published_at).await? {
                    log::debug!("Reached known posting from {published_at}");
                    break;
                }
                dates.push(Some(published_at));
            }
            Err(AppError::InvalidDateFormat { raw }) => {
                log::warn!("Skipping row with unparseable date {:?}", raw.trim());
                dates.push(None);
            }
            Err(e) => return Err(e),
        }
    }

    let novel_count = dates.len();
    Ok(Novelty {
        novel_count,
        stop: novel_count < date_texts.len(),
        dates,
    })
}
