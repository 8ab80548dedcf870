//! In-process listing site used by the pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::PostingRecord;
use crate::storage::{MemoryStorage, PostingStore};
use crate::utils::http::PageSource;

pub const ORIGIN: &str = "http://paste.onion";

/// Serves canned pages and records every requested URL.
#[derive(Default)]
pub struct FakeSite {
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, path: &str, body: impl Into<String>) {
        self.pages
            .lock()
            .unwrap()
            .insert(format!("{ORIGIN}{path}"), body.into());
    }

    pub fn remove(&self, path: &str) {
        self.pages.lock().unwrap().remove(&format!("{ORIGIN}{path}"));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested(&self, path: &str) -> bool {
        let url = format!("{ORIGIN}{path}");
        self.requests.lock().unwrap().iter().any(|r| *r == url)
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl PageSource for FakeSite {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::transport(url, "HTTP status server error (502 Bad Gateway)"))
    }
}

/// A listing row: (hour of 05 Mar 2024, detail path).
pub type Row<'a> = (u32, &'a str);

/// Render a listing page in the markup the default selectors expect.
pub fn listing_page(rows: &[Row<'_>], next: Option<&str>) -> String {
    let mut html = String::from("<html><body><div class=\"container\">");
    for (hour, detail) in rows {
        html.push_str(&format!(
            "<div class=\"row\">\
               <div class=\"col-sm-5\"><h4>Paste {detail}</h4></div>\
               <div class=\"col-sm-6\">Posted by Anonymous at 05 Mar 2024 {hour:02}:00:00 UTC</div>\
               <div class=\"col-sm-7\"><a href=\"{detail}\">Show paste</a></div>\
             </div>"
        ));
    }
    html.push_str("<ul class=\"pagination\"><li class=\"active\"><span>1</span></li>");
    if let Some(next) = next {
        html.push_str(&format!("<li><a href=\"{next}\">&raquo;</a></li>"));
    }
    html.push_str("</ul></div></body></html>");
    html
}

/// Render a detail page whose body is `text`.
pub fn detail_page(text: &str) -> String {
    format!("<html><body><div style=\"font-size: 12px\">{text}</div></body></html>")
}

/// Serve a listing at `path` plus a detail page for each of its rows.
pub fn serve_listing(site: &FakeSite, path: &str, rows: &[Row<'_>], next: Option<&str>) {
    site.serve(path, listing_page(rows, next));
    for (_, detail) in rows {
        site.serve(detail, detail_page(&format!("content of {detail}")));
    }
}

/// History whose lookups or writes fail on demand.
#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryStorage,
    /// Every `exists_by_date` call fails
    pub fail_lookups: bool,
    /// Batches accepted before writes start failing
    pub batches_allowed: usize,
    batches: AtomicUsize,
}

impl FailingStore {
    pub fn failing_lookups() -> Self {
        Self {
            fail_lookups: true,
            ..Self::default()
        }
    }

    pub fn failing_writes_after(batches_allowed: usize) -> Self {
        Self {
            batches_allowed,
            ..Self::default()
        }
    }
}

#[async_trait]
impl PostingStore for FailingStore {
    async fn insert(&self, record: &PostingRecord) -> Result<()> {
        self.inner.insert(record).await
    }

    async fn insert_batch(&self, records: &[PostingRecord]) -> Result<usize> {
        if self.batches.fetch_add(1, Ordering::SeqCst) >= self.batches_allowed {
            return Err(AppError::storage("disk full"));
        }
        self.inner.insert_batch(records).await
    }

    async fn exists_by_date(&self, published_at: DateTime<Utc>) -> Result<bool> {
        if self.fail_lookups {
            return Err(AppError::storage("history unreadable"));
        }
        self.inner.exists_by_date(published_at).await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }

    async fn purge(&self) -> Result<()> {
        self.inner.purge().await
    }
}
