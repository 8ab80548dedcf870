//! Service layer for the harvester.
//!
//! This module contains the per-page transformations the crawl is built from:
//! - Date normalization (`dates`)
//! - Listing row extraction (`ListingParser`)
//! - Next-page discovery (`Paginator`)
//! - Novelty detection against history (`filter_novel`)
//! - Detail body retrieval (`ContentFetcher`)

mod content;
pub mod dates;
mod listing;
mod novelty;
mod pagination;

pub use content::ContentFetcher;
pub use listing::ListingParser;
pub use novelty::{Novelty, filter_novel};
pub use pagination::Paginator;
