// src/services/listing.rs

//! Listing page parser.
//!
//! A listing page carries, per posting row, a metadata block (author link and
//! date text), a title heading and a link to the detail page. Each field is
//! extracted independently in document order; rows are reassembled by index.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{ListingEntry, SelectorConfig, parse_selector};
use crate::utils::resolve_url;

/// Extracts [`ListingEntry`] rows from listing pages.
pub struct ListingParser {
    metadata: Selector,
    author_link: Selector,
    title: Selector,
    detail_link: Selector,
}

impl ListingParser {
    /// Compile the listing selectors.
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            metadata: parse_selector(&selectors.metadata)?,
            author_link: parse_selector(&selectors.author_link)?,
            title: parse_selector(&selectors.title)?,
            detail_link: parse_selector(&selectors.detail_link)?,
        })
    }

    /// Date text of every row on the page.
    ///
    /// This is the last direct text node of each metadata block; a block
    /// without one yields an empty string so rows stay aligned.
    pub fn date_texts(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.metadata)
            .map(|block| last_text_node(&block))
            .collect()
    }

    /// Authors of the first `limit` rows. Rows without a user link are anonymous.
    pub fn authors(&self, document: &Html, limit: usize) -> Vec<String> {
        document
            .select(&self.metadata)
            .take(limit)
            .map(|block| {
                block
                    .select(&self.author_link)
                    .next()
                    .map(|link| link.text().collect::<String>().trim().to_string())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Titles of the first `limit` rows.
    pub fn titles(&self, document: &Html, limit: usize) -> Vec<String> {
        document
            .select(&self.title)
            .take(limit)
            .map(|heading| heading.text().collect::<String>().trim().to_string())
            .collect()
    }

    /// Detail page URLs of the first `limit` rows, resolved against `base`.
    pub fn detail_links(&self, document: &Html, base: &Url, limit: usize) -> Vec<String> {
        document
            .select(&self.detail_link)
            .take(limit)
            .map(|anchor| {
                anchor
                    .value()
                    .attr("href")
                    .map(|href| resolve_url(base, href.trim()))
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Assemble the first `limit` rows.
    ///
    /// If the field lists disagree in length (malformed markup) the shortest
    /// one bounds the result.
    pub fn parse_entries(&self, document: &Html, base: &Url, limit: usize) -> Vec<ListingEntry> {
        let mut dates = self.date_texts(document);
        dates.truncate(limit);
        let authors = self.authors(document, limit);
        let titles = self.titles(document, limit);
        let links = self.detail_links(document, base, limit);

        let lengths = [dates.len(), authors.len(), titles.len(), links.len()];
        let rows = lengths.iter().copied().min().unwrap_or(0);
        if lengths.iter().any(|&len| len != rows) {
            log::warn!(
                "Listing {} has mismatched rows (dates={}, authors={}, titles={}, links={}); keeping {}",
                base,
                dates.len(),
                authors.len(),
                titles.len(),
                links.len(),
                rows
            );
        }

        dates
            .into_iter()
            .zip(authors)
            .zip(titles)
            .zip(links)
            .map(|(((date_text, author), title), detail_link)| ListingEntry {
                author,
                title,
                date_text,
                detail_link,
            })
            .collect()
    }
}

fn last_text_node(element: &ElementRef) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .last()
        .map(|text| (**text).to_owned())
        .unwrap_or_default()
}
