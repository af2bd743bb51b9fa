use crate::error::{Result, ScanError};
use crate::extractor::Extractor;
use crate::page::{Page, resolve_href};
use crate::result::ListingRecord;
use crate::selectors::SelectorTable;
use crate::wait::WaitTimings;
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Called after every container pass with `(processed, limit)`
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;
/// Called with each record as soon as it is extracted
pub type ResultCallback = Arc<dyn Fn(&ListingRecord) + Send + Sync>;
/// Called with a message whenever a listing is skipped after a failure
pub type WarningCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Keys of feed children already handled. Shared between runs on the same
/// page; it only grows until the feed is reloaded.
pub type VisitedSet = Arc<Mutex<HashSet<ListingKey>>>;

pub fn new_visited_set() -> VisitedSet {
    Arc::new(Mutex::new(HashSet::new()))
}

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_LIMIT: usize = 100;

/// Identity of a feed child across re-renders of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingKey {
    /// Resolved URL of the child's listing link
    Link(String),
    /// Hash of the text of a child without a usable link
    Content(u64),
}

impl ListingKey {
    fn from_text(text: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        text.trim().hash(&mut hasher);
        ListingKey::Content(hasher.finish())
    }
}

pub struct Crawler<P: Page> {
    page: Arc<P>,
    interval: Duration,
    limit: usize,
    selectors: SelectorTable,
    timings: WaitTimings,
    visited: VisitedSet,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
    warning_callback: Option<WarningCallback>,
}

impl<P: Page> Crawler<P> {
    pub fn new(page: Arc<P>) -> Self {
        Self {
            page,
            interval: DEFAULT_INTERVAL,
            limit: DEFAULT_LIMIT,
            selectors: SelectorTable::default(),
            timings: WaitTimings::default(),
            visited: new_visited_set(),
            progress_callback: None,
            result_callback: None,
            warning_callback: None,
        }
    }

    /// Continue from the listings an earlier run already handled
    pub fn with_visited(mut self, visited: VisitedSet) -> Self {
        self.visited = visited;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_selectors(mut self, selectors: SelectorTable) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_timings(mut self, timings: WaitTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn with_warning_callback(mut self, callback: WarningCallback) -> Self {
        self.warning_callback = Some(callback);
        self
    }

    /// Walk the listings feed shown by the page, visiting every new listing
    /// until the limit is reached or a pass finds nothing new.
    ///
    /// Failures on a single listing are logged and skipped. Only a failure
    /// to read the feed itself ends the run with an error.
    pub async fn crawl(&self) -> Result<Vec<ListingRecord>> {
        let started = Instant::now();

        let feed_url = self.page.current_url().await?;
        let container_css = self.selectors.listings_container_css();
        info!(
            "Starting listing crawl of {} (interval {:?}, limit {})",
            feed_url, self.interval, self.limit
        );

        let mut records = Vec::new();
        let mut processed = 0usize;
        let mut passes = 0usize;

        loop {
            let Some(container) = self.page.query_first(&container_css).await? else {
                self.warn("Listings container not found, ending run".to_string());
                break;
            };
            passes += 1;

            let mut fresh = Vec::new();
            {
                let visited = self.visited.lock().await;
                for child in self.page.children(&container).await? {
                    let key = self.fingerprint(&child).await?;
                    if !visited.contains(&key) && !fresh.contains(&key) {
                        fresh.push(key);
                    }
                }
            }
            debug!("Pass {}: {} unvisited listings", passes, fresh.len());

            let found_new = !fresh.is_empty();
            for key in fresh {
                if processed >= self.limit {
                    break;
                }
                if !self.visited.lock().await.insert(key.clone()) {
                    continue;
                }
                let ListingKey::Link(link) = key else {
                    debug!("Skipping feed child without a listing link");
                    continue;
                };

                processed += 1;
                match self.process_listing(&container_css, &link).await {
                    Ok(Some(record)) => {
                        if let Some(ref callback) = self.result_callback {
                            callback(&record);
                        }
                        records.push(record);
                    }
                    Ok(None) => debug!("No listing details found for {}", link),
                    Err(e) => {
                        self.warn(format!("Failed to scrape listing {}: {}", link, e));
                        self.recover(&feed_url).await;
                    }
                }
            }

            if let Some(ref callback) = self.progress_callback {
                callback(processed, self.limit);
            }

            if !found_new {
                debug!("No unvisited listings left");
                break;
            }
            if processed >= self.limit {
                debug!("Reached limit of {} listings", self.limit);
                break;
            }

            tokio::time::sleep(self.interval).await;
        }

        info!(
            "Crawl finished: {} listings processed, {} recorded in {} passes ({:.2}s)",
            processed,
            records.len(),
            passes,
            started.elapsed().as_secs_f64()
        );
        Ok(records)
    }

    fn warn(&self, message: String) {
        warn!("{}", message);
        if let Some(ref callback) = self.warning_callback {
            callback(&message);
        }
    }

    pub async fn visited_count(&self) -> usize {
        self.visited.lock().await.len()
    }

    async fn fingerprint(&self, child: &P::Element) -> Result<ListingKey> {
        if let Some(url) = self.link_of(child).await? {
            return Ok(ListingKey::Link(url));
        }
        Ok(ListingKey::from_text(&self.page.text(child).await?))
    }

    /// The listing link inside a feed child and its resolved URL
    async fn link_of(&self, child: &P::Element) -> Result<Option<String>> {
        let Some(anchor) = self
            .page
            .query_within(child, &self.selectors.listing_link)
            .await?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };
        let base = self.page.current_url().await?;
        Ok(self
            .page
            .attr(&anchor, "href")
            .await?
            .and_then(|href| resolve_href(&base, &href)))
    }

    /// Find the anchor for `link` in the freshly rendered feed
    async fn locate_link(&self, container_css: &str, link: &str) -> Result<Option<P::Element>> {
        let Some(container) = self.page.query_first(container_css).await? else {
            return Ok(None);
        };
        let base = self.page.current_url().await?;
        for child in self.page.children(&container).await? {
            if let Some(anchor) = self
                .page
                .query_within(&child, &self.selectors.listing_link)
                .await?
                .into_iter()
                .next()
            {
                let href = self.page.attr(&anchor, "href").await?;
                if href.and_then(|h| resolve_href(&base, &h)).as_deref() == Some(link) {
                    return Ok(Some(anchor));
                }
            }
        }
        Ok(None)
    }

    async fn process_listing(&self, container_css: &str, link: &str) -> Result<Option<ListingRecord>> {
        let listing_link = self.page.current_url().await?;
        let anchor = self
            .locate_link(container_css, link)
            .await?
            .ok_or_else(|| ScanError::StaleElement(format!("listing link {} left the feed", link)))?;

        self.page.click(&anchor).await?;
        let mut navigations = 1;

        let summary_css = self.selectors.detail_summary.as_str();
        let ready = self
            .timings
            .detail_render()
            .until(|| async { matches!(self.page.query_first(summary_css).await, Ok(Some(_))) })
            .await;
        if !ready {
            debug!("Detail view for {} did not render in time", link);
        }

        let extractor = Extractor::new(self.page.as_ref(), &self.selectors, &self.timings);
        let record = match extractor.summary().await {
            Some(summary) => {
                let description = extractor.description().await;
                let location = extractor.location().await;
                let seller = extractor.seller().await;
                if seller.navigated {
                    navigations += 1;
                }

                Some(ListingRecord {
                    title: summary.title,
                    price: summary.price,
                    section_type: summary.section_type,
                    location,
                    description,
                    seller_name: seller.name,
                    seller_profile: seller.profile,
                    listing_link,
                    ..Default::default()
                })
            }
            None => None,
        };

        self.return_to_listings(navigations).await?;
        Ok(record)
    }

    /// Go back until the feed shows again, at most once per navigation
    async fn return_to_listings(&self, navigations: usize) -> Result<()> {
        for _ in 0..navigations {
            self.page.back().await?;
            if self.wait_for_listings().await {
                return Ok(());
            }
        }
        debug!("Listings view not visible after going back");
        Ok(())
    }

    async fn wait_for_listings(&self) -> bool {
        let css = self.selectors.listings_container_css();
        self.timings
            .listings_render()
            .until(|| async { matches!(self.page.query_first(&css).await, Ok(Some(_))) })
            .await
    }

    async fn recover(&self, feed_url: &str) {
        if let Err(e) = self.page.goto(feed_url).await {
            warn!("Could not return to {}: {}", feed_url, e);
            return;
        }
        if !self.wait_for_listings().await {
            debug!("Listings view not visible after returning to {}", feed_url);
        }
    }
}
