//! Detail page body retrieval.

use scraper::{Html, Selector};

use crate::error::Result;
use crate::models::{SelectorConfig, parse_selector};
use crate::utils::http::PageSource;

/// Fetches a posting's detail page and flattens its body to text.
pub struct ContentFetcher {
    container: Selector,
}

impl ContentFetcher {
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            container: parse_selector(&selectors.content)?,
        })
    }

    /// Fetch `link` and return its body text.
    pub async fn fetch_content(&self, source: &dyn PageSource, link: &str) -> Result<String> {
        let html = source.fetch(link).await?;
        Ok(self.extract(&Html::parse_document(&html)))
    }

    /// Join the non-blank lines of the containers' direct text nodes, in
    /// document order.
    pub fn extract(&self, document: &Html) -> String {
        document
            .select(&self.container)
            .flat_map(|container| container.children())
            .filter_map(|node| node.value().as_text())
            .flat_map(|text| text.lines())
            .filter(|line| !line.trim().is_empty())
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::error::AppError;

    struct StaticSource(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl PageSource for StaticSource {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.0
                .get(url)
                .map(|body| body.to_string())
                .ok_or_else(|| AppError::transport(url, "404 Not Found"))
        }
    }

    const DETAIL: &str = "<html><body>\
        <div class=\"header\">not content</div>\
        <div style=\"font-family: monospace\">\n  first line\n\n   \n<br>second line  <br>\n<b>bold is skipped</b>third line\n</div>\
        </body></html>";

    fn fetcher() -> ContentFetcher {
        ContentFetcher::new(&SelectorConfig::default()).unwrap()
    }

    #[test]
    fn test_extract_drops_blank_lines() {
        let doc = Html::parse_document(DETAIL);
        assert_eq!(
            fetcher().extract(&doc),
            "  first line\nsecond line\nthird line"
        );
    }

    #[test]
    fn test_extract_without_container() {
        let doc = Html::parse_document("<p>nothing here</p>");
        assert_eq!(fetcher().extract(&doc), "");
    }

    #[tokio::test]
    async fn test_fetch_content() {
        let source = StaticSource(HashMap::from([("http://paste.onion/show/a", DETAIL)]));
        let content = fetcher()
            .fetch_content(&source, "http://paste.onion/show/a")
            .await
            .unwrap();
        assert!(content.starts_with("  first line"));
    }

    #[tokio::test]
    async fn test_fetch_content_propagates_transport_error() {
        let source = StaticSource(HashMap::new());
        let err = fetcher()
            .fetch_content(&source, "http://paste.onion/show/missing")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport { .. }));
    }
}
