//! Application configuration structures.

use std::fs;
use std::path::Path;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and traversal settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Markup contract of the listing and detail pages
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Periodic run settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Persisted history location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or the defaults if the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(&path) {
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            result => result,
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.crawler.start_url).map_err(|e| {
            AppError::validation(format!(
                "crawler.start_url '{}' is not a valid URL: {e}",
                self.crawler.start_url
            ))
        })?;
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.connect_timeout_secs == 0 {
            return Err(AppError::validation(
                "crawler.connect_timeout_secs must be > 0",
            ));
        }
        if self.crawler.max_pages == Some(0) {
            return Err(AppError::validation("crawler.max_pages must be > 0"));
        }
        for endpoint in [&self.crawler.proxy.http, &self.crawler.proxy.https]
            .into_iter()
            .flatten()
        {
            url::Url::parse(endpoint).map_err(|e| {
                AppError::validation(format!("proxy endpoint '{endpoint}' is invalid: {e}"))
            })?;
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        if self.storage.path.trim().is_empty() {
            return Err(AppError::validation("storage.path is empty"));
        }
        self.selectors.validate()
    }
}

/// HTTP client and traversal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// First listing page of every run
    #[serde(default = "defaults::start_url")]
    pub start_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound on listing pages visited in one run (unbounded if unset)
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Proxy endpoints shared by every request
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: defaults::start_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            connect_timeout_secs: defaults::connect_timeout(),
            max_pages: None,
            proxy: ProxyConfig::default(),
        }
    }
}

/// Proxy endpoints per URL scheme.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy for `http://` URLs (e.g. `http://127.0.0.1:8118`)
    #[serde(default)]
    pub http: Option<String>,

    /// Proxy for `https://` URLs
    #[serde(default)]
    pub https: Option<String>,
}

/// CSS selectors describing the markup the crawl relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Per-row metadata block carrying author link and date text
    #[serde(default = "defaults::metadata")]
    pub metadata: String,

    /// User link inside a metadata block
    #[serde(default = "defaults::author_link")]
    pub author_link: String,

    /// Per-row title heading
    #[serde(default = "defaults::title")]
    pub title: String,

    /// Per-row anchor pointing at the detail page
    #[serde(default = "defaults::detail_link")]
    pub detail_link: String,

    /// Items of the pagination control list
    #[serde(default = "defaults::pagination_item")]
    pub pagination_item: String,

    /// Link inside a pagination item
    #[serde(default = "defaults::pagination_link")]
    pub pagination_link: String,

    /// Body container on the detail page
    #[serde(default = "defaults::content")]
    pub content: String,

    /// Text of the "next" pagination control. When unset, the last
    /// pagination item is followed.
    #[serde(default)]
    pub next_label: Option<String>,
}

impl SelectorConfig {
    fn validate(&self) -> Result<()> {
        for (name, selector) in [
            ("selectors.metadata", &self.metadata),
            ("selectors.author_link", &self.author_link),
            ("selectors.title", &self.title),
            ("selectors.detail_link", &self.detail_link),
            ("selectors.pagination_item", &self.pagination_item),
            ("selectors.pagination_link", &self.pagination_link),
            ("selectors.content", &self.content),
        ] {
            parse_selector(selector)
                .map_err(|e| AppError::validation(format!("{name}: {e}")))?;
        }
        if let Some(label) = &self.next_label {
            if label.trim().is_empty() {
                return Err(AppError::validation("selectors.next_label is empty"));
            }
        }
        Ok(())
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            metadata: defaults::metadata(),
            author_link: defaults::author_link(),
            title: defaults::title(),
            detail_link: defaults::detail_link(),
            pagination_item: defaults::pagination_item(),
            pagination_link: defaults::pagination_link(),
            content: defaults::content(),
            next_label: None,
        }
    }
}

/// Periodic run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between the starts of two scheduled runs
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Run once immediately before waiting for the first interval
    #[serde(default = "defaults::run_on_start")]
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            run_on_start: defaults::run_on_start(),
        }
    }
}

/// Persisted history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON history file
    #[serde(default = "defaults::storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: defaults::storage_path(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// Compile a CSS selector, mapping failures into [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

mod defaults {
    // Crawler defaults
    pub fn start_url() -> String {
        "http://nzxj65x32vh2fkhk.onion/all".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; harvester/0.1)".into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn connect_timeout() -> u64 {
        20
    }

    // Markup defaults
    pub fn metadata() -> String {
        "div.col-sm-6".into()
    }
    pub fn author_link() -> String {
        "a".into()
    }
    pub fn title() -> String {
        "div.col-sm-5 h4".into()
    }
    pub fn detail_link() -> String {
        "div.col-sm-7 a".into()
    }
    pub fn pagination_item() -> String {
        "ul.pagination li".into()
    }
    pub fn pagination_link() -> String {
        "a".into()
    }
    pub fn content() -> String {
        "div[style^='font']".into()
    }

    // Schedule defaults
    pub fn interval() -> u64 {
        60
    }
    pub fn run_on_start() -> bool {
        true
    }

    // Storage defaults
    pub fn storage_path() -> String {
        "db.json".into()
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}
