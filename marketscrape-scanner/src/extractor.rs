//! Field extraction from a listing's detail view.
//!
//! None of the public methods fail: a missing or renamed element degrades
//! the field to its sentinel and leaves a debug log line behind.

use crate::error::Result;
use crate::page::{Page, resolve_href};
use crate::result::{NOT_AVAILABLE, UNKNOWN};
use crate::selectors::SelectorTable;
use crate::wait::WaitTimings;
use tracing::{debug, warn};

/// Title, price and section type, read positionally from the summary block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub title: String,
    pub price: String,
    pub section_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerDetails {
    pub name: String,
    pub profile: String,
    /// Whether clicking the seller anchor may have left the detail view
    pub navigated: bool,
}

impl SellerDetails {
    fn unknown() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            profile: UNKNOWN.to_string(),
            navigated: false,
        }
    }
}

pub struct Extractor<'a, P: Page> {
    page: &'a P,
    selectors: &'a SelectorTable,
    timings: &'a WaitTimings,
}

fn non_empty_or(text: &str, sentinel: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        sentinel.to_string()
    } else {
        trimmed.to_string()
    }
}

impl<'a, P: Page> Extractor<'a, P> {
    pub fn new(page: &'a P, selectors: &'a SelectorTable, timings: &'a WaitTimings) -> Self {
        Self {
            page,
            selectors,
            timings,
        }
    }

    /// `None` when the summary block is missing, meaning the detail view
    /// never rendered and the listing should not be recorded.
    pub async fn summary(&self) -> Option<Summary> {
        match self.try_summary().await {
            Ok(summary) => summary,
            Err(e) => {
                debug!("Summary extraction failed: {}", e);
                None
            }
        }
    }

    async fn try_summary(&self) -> Result<Option<Summary>> {
        let Some(container) = self.page.query_first(&self.selectors.detail_summary).await? else {
            warn!("Listing summary element not found");
            return Ok(None);
        };

        let mut texts = self.page.child_texts(&container).await?.into_iter();
        let mut next = || texts.next().unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Ok(Some(Summary {
            title: next(),
            price: next(),
            section_type: next(),
        }))
    }

    pub async fn description(&self) -> String {
        self.try_description().await.unwrap_or_else(|e| {
            debug!("Description extraction failed: {}", e);
            NOT_AVAILABLE.to_string()
        })
    }

    async fn try_description(&self) -> Result<String> {
        let see_more = self.selectors.see_more_label.to_lowercase();
        let see_less = self.selectors.see_less_label.to_lowercase();

        let mut toggle = None;
        for span in self.page.query_all(&self.selectors.description_toggle_css()).await? {
            let label = self.page.text(&span).await?.trim().to_lowercase();
            if label == see_less {
                break;
            }
            if label == see_more {
                toggle = Some(span);
                break;
            }
        }

        if let Some(toggle) = toggle {
            self.page.click(&toggle).await?;
            let expanded = self
                .timings
                .description_expand()
                .until(|| self.shows_toggle_label(&see_less))
                .await;
            if !expanded {
                debug!("Description did not report expansion before timeout");
            }
        }

        let Some(body) = self.page.query_first(&self.selectors.description_body).await? else {
            return Ok(NOT_AVAILABLE.to_string());
        };
        let spans = self
            .page
            .query_within(&body, &self.selectors.description_text)
            .await?;
        match spans.first() {
            Some(span) => Ok(non_empty_or(&self.page.text(span).await?, NOT_AVAILABLE)),
            None => Ok(NOT_AVAILABLE.to_string()),
        }
    }

    async fn shows_toggle_label(&self, label: &str) -> bool {
        let Ok(spans) = self.page.query_all(&self.selectors.description_toggle_css()).await else {
            return false;
        };
        for span in spans {
            if let Ok(text) = self.page.text(&span).await {
                if text.trim().to_lowercase() == label {
                    return true;
                }
            }
        }
        false
    }

    pub async fn location(&self) -> String {
        self.try_location().await.unwrap_or_else(|e| {
            debug!("Location extraction failed: {}", e);
            UNKNOWN.to_string()
        })
    }

    async fn try_location(&self) -> Result<String> {
        let blocks = self.page.query_all(&self.selectors.location_blocks_css()).await?;
        let Some(block) = blocks.get(self.selectors.location_index) else {
            return Ok(UNKNOWN.to_string());
        };

        let spans = self
            .page
            .query_within(block, &self.selectors.location_text)
            .await?;
        match spans.first() {
            Some(span) => Ok(non_empty_or(&self.page.text(span).await?, UNKNOWN)),
            None => Ok(UNKNOWN.to_string()),
        }
    }

    /// Reads the seller anchor, follows it and prefers the name shown on
    /// the seller view when that view renders one.
    pub async fn seller(&self) -> SellerDetails {
        self.try_seller().await.unwrap_or_else(|e| {
            debug!("Seller extraction failed: {}", e);
            SellerDetails::unknown()
        })
    }

    async fn try_seller(&self) -> Result<SellerDetails> {
        let Some(anchor) = self.find_seller_anchor().await? else {
            debug!("Seller details anchor not found");
            return Ok(SellerDetails::unknown());
        };

        let name = non_empty_or(&self.page.text(&anchor).await?, UNKNOWN);
        let base = self.page.current_url().await?;
        let profile = self
            .page
            .attr(&anchor, "href")
            .await?
            .and_then(|href| resolve_href(&base, &href))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let mut details = SellerDetails {
            name,
            profile,
            navigated: false,
        };

        if let Err(e) = self.page.click(&anchor).await {
            debug!("Could not open seller details: {}", e);
            return Ok(details);
        }
        details.navigated = true;

        match self.profile_name().await {
            Ok(Some(name)) => details.name = name,
            Ok(None) => debug!("Seller view showed no name, keeping anchor text"),
            Err(e) => debug!("Seller name lookup failed: {}", e),
        }

        Ok(details)
    }

    async fn find_seller_anchor(&self) -> Result<Option<P::Element>> {
        let label = self.selectors.seller_anchor_label.as_str();
        for candidate in self.page.query_all(&self.selectors.seller_candidates_css()).await? {
            for anchor in self
                .page
                .query_within(&candidate, &self.selectors.seller_anchor)
                .await?
            {
                if self.page.attr(&anchor, "aria-label").await?.as_deref() == Some(label) {
                    return Ok(Some(anchor));
                }
            }
        }
        Ok(None)
    }

    async fn profile_name(&self) -> Result<Option<String>> {
        let css = self.selectors.seller_profile_name.as_str();
        let rendered = self
            .timings
            .seller_render()
            .until(|| async { matches!(self.page.query_first(css).await, Ok(Some(_))) })
            .await;
        if !rendered {
            return Ok(None);
        }

        match self.page.query_first(css).await? {
            Some(element) => Ok(Some(non_empty_or(&self.page.text(&element).await?, UNKNOWN))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotSite;
    use std::time::Duration;
    use tokio::time::Instant;

    const DETAIL: &str = "https://market.test/item/1";

    fn selectors() -> SelectorTable {
        SelectorTable {
            listings_container: "feed".to_string(),
            detail_summary: ".summary".to_string(),
            description_toggle: "toggle".to_string(),
            description_body: "div.description".to_string(),
            location_blocks: "block".to_string(),
            seller_candidates: "seller-box".to_string(),
            seller_profile_name: ".profile-name".to_string(),
            ..Default::default()
        }
    }

    fn detail(body: &str) -> String {
        format!("<html><body>{}</body></html>", body)
    }

    fn site_with(body: &str) -> SnapshotSite {
        SnapshotSite::new()
            .with_page(DETAIL, detail(body))
            .starting_at(DETAIL)
    }

    // ========================================================================
    // Summary
    // ========================================================================

    #[tokio::test]
    async fn test_summary_reads_first_three_texts_in_order() {
        let site = site_with(
            r#"<div class="summary"><h1>Road bike</h1> $350 <span>Sporting goods</span><span>extra</span></div>"#,
        );
        let sel = selectors();
        let timings = WaitTimings::default();

        let summary = Extractor::new(&site, &sel, &timings).summary().await.unwrap();
        assert_eq!(summary.title, "Road bike");
        assert_eq!(summary.price, "$350");
        assert_eq!(summary.section_type, "Sporting goods");
    }

    #[tokio::test]
    async fn test_summary_pads_missing_texts() {
        let site = site_with(r#"<div class="summary"><h1>Lamp</h1></div>"#);
        let sel = selectors();
        let timings = WaitTimings::default();

        let summary = Extractor::new(&site, &sel, &timings).summary().await.unwrap();
        assert_eq!(summary.title, "Lamp");
        assert_eq!(summary.price, NOT_AVAILABLE);
        assert_eq!(summary.section_type, NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn test_summary_missing_container() {
        let site = site_with("<p>nothing here</p>");
        let sel = selectors();
        let timings = WaitTimings::default();

        assert!(Extractor::new(&site, &sel, &timings).summary().await.is_none());
    }

    // ========================================================================
    // Description
    // ========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_description_without_toggle_or_body_returns_sentinel_without_waiting() {
        let site = site_with(r#"<div class="summary">x</div>"#);
        let sel = selectors();
        let timings = WaitTimings::default();
        let started = Instant::now();

        let description = Extractor::new(&site, &sel, &timings).description().await;

        assert_eq!(description, NOT_AVAILABLE);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_description_read_directly_when_no_toggle() {
        let site = site_with(r#"<div class="description"><span> Barely used </span></div>"#);
        let sel = selectors();
        let timings = WaitTimings::default();
        let started = Instant::now();

        let description = Extractor::new(&site, &sel, &timings).description().await;

        assert_eq!(description, "Barely used");
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_description_expands_see_more() {
        let site = SnapshotSite::new()
            .with_page(
                DETAIL,
                detail(r#"<span class="toggle">See more</span><div class="description"><span>Short…</span></div>"#),
            )
            .with_page(
                "expanded",
                detail(r#"<span class="toggle">See less</span><div class="description"><span>Short and then the long part</span></div>"#),
            )
            .with_transition(DETAIL, "See more", "expanded")
            .starting_at(DETAIL);
        let sel = selectors();
        let timings = WaitTimings::default();
        let started = Instant::now();

        let description = Extractor::new(&site, &sel, &timings).description().await;

        assert_eq!(description, "Short and then the long part");
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_description_already_expanded_is_not_clicked() {
        // Clicking "See less" would collapse the text again
        let site = SnapshotSite::new()
            .with_page(
                DETAIL,
                detail(r#"<span class="toggle">See less</span><div class="description"><span>Full text</span></div>"#),
            )
            .with_page("collapsed", detail(r#"<div class="description"><span>Fu…</span></div>"#))
            .with_transition(DETAIL, "See less", "collapsed")
            .starting_at(DETAIL);
        let sel = selectors();
        let timings = WaitTimings::default();

        let description = Extractor::new(&site, &sel, &timings).description().await;
        assert_eq!(description, "Full text");
    }

    #[tokio::test(start_paused = true)]
    async fn test_description_toggle_that_never_expands_waits_at_most_the_timeout() {
        let site = site_with(
            r#"<span class="toggle">See more</span><div class="description"><span>Short…</span></div>"#,
        );
        let sel = selectors();
        let timings = WaitTimings::default();
        let started = Instant::now();

        let description = Extractor::new(&site, &sel, &timings).description().await;

        assert_eq!(description, "Short…");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_millis(1200));
    }

    // ========================================================================
    // Location
    // ========================================================================

    #[tokio::test]
    async fn test_location_uses_third_block() {
        let site = site_with(
            r#"<div class="block"><span>first</span></div>
               <div class="block"><span>second</span></div>
               <div class="block"><span>Springfield, IL</span><span>2 miles</span></div>"#,
        );
        let sel = selectors();
        let timings = WaitTimings::default();

        assert_eq!(Extractor::new(&site, &sel, &timings).location().await, "Springfield, IL");
    }

    #[tokio::test]
    async fn test_location_unknown_when_too_few_blocks() {
        let site = site_with(r#"<div class="block"><span>first</span></div>"#);
        let sel = selectors();
        let timings = WaitTimings::default();

        assert_eq!(Extractor::new(&site, &sel, &timings).location().await, UNKNOWN);
    }

    // ========================================================================
    // Seller
    // ========================================================================

    const SELLER_BOX: &str = r#"<div class="seller-box">
        <a href="/profile/99" aria-label="Other">not this</a>
        <a href="/profile/42" aria-label="Seller details">Jo B.</a>
    </div>"#;

    #[tokio::test(start_paused = true)]
    async fn test_seller_name_overwritten_when_profile_name_renders() {
        let site = SnapshotSite::new()
            .with_page(DETAIL, detail(SELLER_BOX))
            .with_page(
                "https://market.test/profile/42",
                detail(r#"<h2 class="profile-name"> Jo Bloggs </h2>"#),
            )
            .starting_at(DETAIL);
        let sel = selectors();
        let timings = WaitTimings::default();

        let seller = Extractor::new(&site, &sel, &timings).seller().await;

        assert_eq!(seller.name, "Jo Bloggs");
        assert_eq!(seller.profile, "https://market.test/profile/42");
        assert!(seller.navigated);
        assert_eq!(site.current_url().await.unwrap(), "https://market.test/profile/42");
    }

    #[tokio::test(start_paused = true)]
    async fn test_seller_name_kept_when_profile_name_missing() {
        let site = SnapshotSite::new()
            .with_page(DETAIL, detail(SELLER_BOX))
            .starting_at(DETAIL);
        let sel = selectors();
        let timings = WaitTimings::default();
        let started = Instant::now();

        let seller = Extractor::new(&site, &sel, &timings).seller().await;

        assert_eq!(seller.name, "Jo B.");
        assert_eq!(seller.profile, "https://market.test/profile/42");
        assert!(seller.navigated);
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seller_unknown_without_anchor() {
        let site = site_with(r#"<div class="seller-box"><a href="/x" aria-label="Message">Message</a></div>"#);
        let sel = selectors();
        let timings = WaitTimings::default();
        let started = Instant::now();

        let seller = Extractor::new(&site, &sel, &timings).seller().await;

        assert_eq!(seller, SellerDetails::unknown());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
