//! Next-page discovery on listing pages.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{SelectorConfig, parse_selector};
use crate::utils::resolve_url;

/// Finds the address of the next listing page.
///
/// Without a `next_label`, the last pagination item is assumed to be the
/// "next" control. Sites that also render a "last page" control after it
/// need `next_label` set.
pub struct Paginator {
    item: Selector,
    link: Selector,
    next_label: Option<String>,
}

impl Paginator {
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            item: parse_selector(&selectors.pagination_item)?,
            link: parse_selector(&selectors.pagination_link)?,
            next_label: selectors
                .next_label
                .as_ref()
                .map(|label| label.trim().to_lowercase()),
        })
    }

    /// URL of the next listing page, or `None` at the end of the listing.
    pub fn next_page(&self, document: &Html, base: &Url) -> Option<String> {
        let control = match &self.next_label {
            Some(label) => document
                .select(&self.item)
                .filter_map(|item| self.first_link(&item))
                .find(|link| link.text().collect::<String>().trim().to_lowercase() == *label),
            None => document
                .select(&self.item)
                .last()
                .and_then(|item| self.first_link(&item)),
        }?;

        let href = control.value().attr("href")?.trim();
        if href.is_empty() {
            return None;
        }
        Some(resolve_url(base, href))
    }

    fn first_link<'a>(&self, item: &ElementRef<'a>) -> Option<ElementRef<'a>> {
        item.select(&self.link).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGINATION: &str = r#"
        <ul class="pagination">
          <li><a href="/all?page=1">1</a></li>
          <li class="active"><span>2</span></li>
          <li><a href="/all?page=3">Next</a></li>
          <li><a href="/all?page=9">Last</a></li>
        </ul>
    "#;

    fn base() -> Url {
        Url::parse("http://paste.onion/all?page=2").unwrap()
    }

    #[test]
    fn test_last_item_is_followed_by_default() {
        let paginator = Paginator::new(&SelectorConfig::default()).unwrap();
        let doc = Html::parse_document(PAGINATION);
        assert_eq!(
            paginator.next_page(&doc, &base()),
            Some("http://paste.onion/all?page=9".to_string())
        );
    }

    #[test]
    fn test_labeled_next_control() {
        let selectors = SelectorConfig {
            next_label: Some(" next ".to_string()),
            ..SelectorConfig::default()
        };
        let paginator = Paginator::new(&selectors).unwrap();
        let doc = Html::parse_document(PAGINATION);
        assert_eq!(
            paginator.next_page(&doc, &base()),
            Some("http://paste.onion/all?page=3".to_string())
        );
    }

    #[test]
    fn test_labeled_next_control_missing() {
        let selectors = SelectorConfig {
            next_label: Some("older".to_string()),
            ..SelectorConfig::default()
        };
        let paginator = Paginator::new(&selectors).unwrap();
        let doc = Html::parse_document(PAGINATION);
        assert_eq!(paginator.next_page(&doc, &base()), None);
    }

    #[test]
    fn test_empty_pagination_is_end_of_listing() {
        let paginator = Paginator::new(&SelectorConfig::default()).unwrap();
        let doc = Html::parse_document(r#"<ul class="pagination"></ul>"#);
        assert_eq!(paginator.next_page(&doc, &base()), None);
    }

    #[test]
    fn test_last_item_without_link_is_end_of_listing() {
        let paginator = Paginator::new(&SelectorConfig::default()).unwrap();
        let doc = Html::parse_document(
            r#"<ul class="pagination"><li><a href="/all?page=1">1</a></li><li><span>2</span></li></ul>"#,
        );
        assert_eq!(paginator.next_page(&doc, &base()), None);
    }
}
