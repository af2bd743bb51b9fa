//! Access to the live document the scraper reads from.
//!
//! Everything the extractors and the crawl loop do goes through [`Page`], so
//! the same logic runs against a WebDriver-controlled browser or an offline
//! [`SnapshotSite`](crate::snapshot::SnapshotSite).

use crate::error::Result;
use async_trait::async_trait;
use url::Url;

#[async_trait]
pub trait Page: Send + Sync {
    /// Opaque handle to an element of the current document
    type Element: Clone + Send + Sync;

    /// Navigate to `url`, adding a history entry
    async fn goto(&self, url: &str) -> Result<()>;

    /// All elements of the document matching `css`, in document order
    async fn query_all(&self, css: &str) -> Result<Vec<Self::Element>>;

    /// First element of the document matching `css`
    async fn query_first(&self, css: &str) -> Result<Option<Self::Element>> {
        Ok(self.query_all(css).await?.into_iter().next())
    }

    /// Descendants of `scope` matching `css`, in document order
    async fn query_within(&self, scope: &Self::Element, css: &str) -> Result<Vec<Self::Element>>;

    /// Direct element children of `element`
    async fn children(&self, element: &Self::Element) -> Result<Vec<Self::Element>>;

    /// Trimmed, non-empty text of the text and element child nodes of `element`
    async fn child_texts(&self, element: &Self::Element) -> Result<Vec<String>>;

    /// Full text content of `element`
    async fn text(&self, element: &Self::Element) -> Result<String>;

    async fn attr(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    async fn click(&self, element: &Self::Element) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Go back one history entry
    async fn back(&self) -> Result<()>;
}

/// Resolve `href` against `base`, dropping the fragment.
///
/// Returns `None` for empty, fragment-only and non-navigational hrefs.
pub fn resolve_href(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let resolved = match Url::parse(base) {
        Ok(base_url) => base_url.join(href).ok()?,
        Err(_) => Url::parse(href).ok()?,
    };

    let mut url = resolved;
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_href() {
        assert_eq!(
            resolve_href("https://market.test/feed", "/item/42/?ref=feed"),
            Some("https://market.test/item/42/?ref=feed".to_string())
        );
    }

    #[test]
    fn test_resolve_drops_fragment() {
        assert_eq!(
            resolve_href("https://market.test/feed", "https://market.test/item/7#photos"),
            Some("https://market.test/item/7".to_string())
        );
    }

    #[test]
    fn test_resolve_rejects_non_navigational() {
        assert_eq!(resolve_href("https://market.test/", ""), None);
        assert_eq!(resolve_href("https://market.test/", "#top"), None);
        assert_eq!(resolve_href("https://market.test/", "javascript:void(0)"), None);
        assert_eq!(resolve_href("https://market.test/", "mailto:a@b.c"), None);
    }

    #[test]
    fn test_resolve_with_unparseable_base() {
        assert_eq!(
            resolve_href("not a url", "https://market.test/x"),
            Some("https://market.test/x".to_string())
        );
        assert_eq!(resolve_href("not a url", "/relative"), None);
    }
}
