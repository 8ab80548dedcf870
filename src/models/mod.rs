// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod posting;
mod run;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, LoggingConfig, ProxyConfig, ScheduleConfig, SelectorConfig,
    StorageConfig, parse_selector,
};
pub use posting::{ListingEntry, PostingRecord, StoredPosting, format_instant};
pub use run::{RunOutcome, Termination};
