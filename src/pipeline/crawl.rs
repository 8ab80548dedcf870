// src/pipeline/crawl.rs

//! Incremental listing crawl.
//!
//! Each page goes through: fetch listing → read date texts → filter novelty →
//! fetch bodies of new rows → persist the batch → follow the next-page control.
//! Traversal ends at the first page containing a known posting, at the last
//! page, or on a listing/storage failure.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use scraper::Html;
use url::Url;

use crate::error::Result;
use crate::models::{Config, PostingRecord, RunOutcome, Termination};
use crate::services::{ContentFetcher, ListingParser, Paginator, filter_novel};
use crate::storage::PostingStore;
use crate::utils::http::PageSource;

/// Result of processing one listing page.
#[derive(Debug)]
pub struct PageReport {
    /// New postings whose bodies were retrieved
    pub records: Vec<PostingRecord>,
    /// Rows before the first known posting
    pub novel_count: usize,
    /// A known posting was found on this page
    pub stop: bool,
    /// Next listing page; `None` once `stop` is set
    pub next_page: Option<String>,
    pub details_skipped: usize,
    pub dates_rejected: usize,
}

/// Drives the page-by-page crawl of one listing site.
pub struct CrawlOrchestrator {
    config: Arc<Config>,
    source: Arc<dyn PageSource>,
    store: Arc<dyn PostingStore>,
    listing: ListingParser,
    paginator: Paginator,
    content: ContentFetcher,
}

impl CrawlOrchestrator {
    /// Create an orchestrator, compiling the configured selectors.
    pub fn new(
        config: Arc<Config>,
        source: Arc<dyn PageSource>,
        store: Arc<dyn PostingStore>,
    ) -> Result<Self> {
        Ok(Self {
            listing: ListingParser::new(&config.selectors)?,
            paginator: Paginator::new(&config.selectors)?,
            content: ContentFetcher::new(&config.selectors)?,
            config,
            source,
            store,
        })
    }

    /// Run one crawl from the configured start URL.
    ///
    /// Never fails: errors end the run and are reported in
    /// [`RunOutcome::termination`]. Pages persisted before a failure stay
    /// persisted.
    pub async fn run(&self) -> RunOutcome {
        let start_time = Utc::now();
        let mut url = self.config.crawler.start_url.clone();
        let mut visited = HashSet::new();
        let mut outcome = RunOutcome {
            new_posting_count: 0,
            pages_visited: 0,
            details_skipped: 0,
            dates_rejected: 0,
            termination: Termination::EndOfListing,
        };

        log::info!("Start crawling {url}");

        loop {
            visited.insert(url.clone());

            let report = match self.process_page(&url).await {
                Ok(report) => report,
                Err(e) => {
                    log::error!("Crawl of {url} aborted: {e}");
                    outcome.termination = Termination::Aborted {
                        reason: e.to_string(),
                    };
                    break;
                }
            };
            outcome.pages_visited += 1;
            outcome.details_skipped += report.details_skipped;
            outcome.dates_rejected += report.dates_rejected;

            match self.store.insert_batch(&report.records).await {
                Ok(stored) => outcome.new_posting_count += stored,
                Err(e) => {
                    log::error!("Failed to store postings from {url}: {e}");
                    outcome.termination = Termination::Aborted {
                        reason: e.to_string(),
                    };
                    break;
                }
            }
            log::info!(
                "Page {}: {} new of {} novel rows ({url})",
                outcome.pages_visited,
                report.records.len(),
                report.novel_count
            );

            if report.stop {
                outcome.termination = Termination::HistoryReached;
                break;
            }
            if self
                .config
                .crawler
                .max_pages
                .is_some_and(|max| outcome.pages_visited >= max)
            {
                outcome.termination = Termination::PageLimit;
                break;
            }
            match report.next_page {
                None => {
                    outcome.termination = Termination::EndOfListing;
                    break;
                }
                Some(next) if visited.contains(&next) => {
                    log::warn!("Next page {next} was already visited in this run");
                    outcome.termination = Termination::Revisited;
                    break;
                }
                Some(next) => url = next,
            }
        }

        let elapsed = Utc::now() - start_time;
        log::info!(
            "Finish crawling in {}s: {} new postings over {} pages ({})",
            elapsed.num_seconds(),
            outcome.new_posting_count,
            outcome.pages_visited,
            outcome.termination
        );
        outcome
    }

    /// Fetch one listing page and collect its new postings.
    ///
    /// Fails only if the listing itself cannot be fetched or the history
    /// cannot be queried. A failed detail page drops that one posting.
    pub async fn process_page(&self, url: &str) -> Result<PageReport> {
        let base = Url::parse(url)?;
        let body = self.source.fetch(url).await?;

        // `Html` is not `Send`; everything needed from the page is pulled out
        // before the history is queried.
        let (date_texts, mut entries, candidate) = {
            let document = Html::parse_document(&body);
            let date_texts = self.listing.date_texts(&document);
            let entries = self
                .listing
                .parse_entries(&document, &base, date_texts.len());
            let candidate = self.paginator.next_page(&document, &base);
            (date_texts, entries, candidate)
        };

        let novelty = filter_novel(&date_texts, self.store.as_ref()).await?;
        entries.truncate(novelty.novel_count);
        let next_page = if novelty.stop { None } else { candidate };

        let mut records = Vec::with_capacity(entries.len());
        let mut details_skipped = 0;
        for (entry, published_at) in entries.into_iter().zip(&novelty.dates) {
            let Some(published_at) = *published_at else {
                log::debug!(
                    "Skipping posting '{}' with unreadable date '{}'",
                    entry.title,
                    entry.date_text.trim()
                );
                continue;
            };
            match self
                .content
                .fetch_content(self.source.as_ref(), &entry.detail_link)
                .await
            {
                Ok(content) => records.push(PostingRecord {
                    author: entry.author,
                    title: entry.title,
                    content,
                    published_at,
                }),
                Err(e) => {
                    log::warn!("Skipping posting '{}': {e}", entry.title);
                    details_skipped += 1;
                }
            }
        }

        Ok(PageReport {
            records,
            novel_count: novelty.novel_count,
            stop: novelty.stop,
            next_page,
            details_skipped,
            dates_rejected: novelty.rejected(),
        })
    }
}
