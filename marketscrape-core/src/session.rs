use crate::config::RunConfig;
use chrono::{DateTime, Local};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use marketscrape_scanner::crawler::{
    ProgressCallback, ResultCallback, VisitedSet, WarningCallback, new_visited_set,
};
use marketscrape_scanner::error::Result;
use marketscrape_scanner::{Crawler, ListingRecord, Page, SelectorTable, UNKNOWN, WaitTimings};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};
use uuid::Uuid;

/// Options for configuring a scrape run
pub struct ScrapeOptions {
    pub run_id: Uuid,
    pub config: RunConfig,
    pub selectors: SelectorTable,
    pub timings: WaitTimings,
    pub show_progress_bar: bool,
    /// Listings handled by earlier runs on the same page. Share one set
    /// between runs so a second run only picks up new listings.
    pub visited: VisitedSet,
    pub warning_callback: Option<WarningCallback>,
}

impl ScrapeOptions {
    pub fn new(config: RunConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            config,
            selectors: SelectorTable::default(),
            timings: WaitTimings::default(),
            show_progress_bar: false,
            visited: new_visited_set(),
            warning_callback: None,
        }
    }
}

/// Callback for reporting `(processed, limit)` after each feed pass
pub type ScrapeProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Callback for reporting individual listings as they come in
pub type ScrapeResultCallback = Arc<dyn Fn(ListingRecord) + Send + Sync>;

/// Outcome of one finished run
#[derive(Debug, Clone)]
pub struct ScrapeSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub limit: usize,
    pub processed: usize,
    pub records: Vec<ListingRecord>,
}

/// Execute a scrape against whatever feed `page` currently shows.
pub async fn execute_scrape<P: Page + 'static>(
    page: Arc<P>,
    options: ScrapeOptions,
    progress_callback: Option<ScrapeProgressCallback>,
    result_callback: Option<ScrapeResultCallback>,
) -> Result<ScrapeSummary> {
    let ScrapeOptions {
        run_id,
        config,
        selectors,
        timings,
        show_progress_bar,
        visited,
        warning_callback,
    } = options;

    let started_at = Local::now();
    info!(
        "Run {} started: interval {}s, limit {}",
        run_id,
        config.interval_secs(),
        config.limit()
    );

    let progress_bar = if show_progress_bar {
        let pb = ProgressBar::new(config.limit() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} listings {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb.set_message("scraping...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed = Arc::new(AtomicUsize::new(0));

    let internal_progress: ProgressCallback = {
        let processed = processed.clone();
        let pb = progress_bar.clone();
        Arc::new(move |count: usize, limit: usize| {
            processed.store(count, Ordering::Relaxed);
            if let Some(ref pb) = pb {
                pb.set_position(count as u64);
            }
            if let Some(ref callback) = progress_callback {
                callback(count, limit);
            }
        })
    };

    let mut crawler = Crawler::new(page)
        .with_interval(config.interval())
        .with_limit(config.limit())
        .with_selectors(selectors)
        .with_timings(timings)
        .with_visited(visited)
        .with_progress_callback(internal_progress);

    if let Some(callback) = warning_callback {
        crawler = crawler.with_warning_callback(callback);
    }

    if result_callback.is_some() || progress_bar.is_some() {
        let pb = progress_bar.clone();
        let result_cb: ResultCallback = Arc::new(move |record: &ListingRecord| {
            if let Some(ref pb) = pb {
                pb.set_message(record.title.clone());
            }
            if let Some(ref callback) = result_callback {
                callback(record.clone());
            }
        });
        crawler = crawler.with_result_callback(result_cb);
    }

    let outcome = crawler.crawl().await;

    if let Some(ref pb) = progress_bar {
        match outcome {
            Ok(ref records) => {
                pb.finish_with_message(format!("done, {} listings scraped", records.len()))
            }
            Err(_) => pb.abandon_with_message("failed"),
        }
    }

    let records = outcome.inspect_err(|e| warn!("Run {} failed: {}", run_id, e))?;
    let summary = ScrapeSummary {
        run_id,
        started_at,
        finished_at: Local::now(),
        limit: config.limit(),
        processed: processed.load(Ordering::Relaxed),
        records,
    };
    info!(
        "Run {} finished with {} listings",
        summary.run_id,
        summary.records.len()
    );
    Ok(summary)
}

/// Generate a plain-text report of a finished run
pub fn generate_scrape_report(summary: &ScrapeSummary) -> String {
    let divider = "━".repeat(52);
    let mut report = String::new();

    report.push_str(&format!("{}\n\n", divider));
    report.push_str(&format!("{}\n", "# Summary:".bold()));
    report.push_str(&format!("  Run: {}\n", summary.run_id));
    report.push_str(&format!(
        "  Started: {}\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    let elapsed = summary.finished_at - summary.started_at;
    report.push_str(&format!("  Duration: {}s\n", elapsed.num_seconds().max(0)));
    report.push_str(&format!(
        "  Listings processed: {} of {}\n",
        summary.processed, summary.limit
    ));
    report.push_str(&format!("  Listings recorded: {}\n", summary.records.len()));

    let with_seller = summary
        .records
        .iter()
        .filter(|r| r.seller_name != UNKNOWN)
        .count();
    report.push_str(&format!("  With seller details: {}\n", with_seller));
    report.push_str(&format!("\n{}\n\n", divider));

    if summary.records.is_empty() {
        report.push_str("  No listings found.\n");
        return report;
    }

    // Group listings by section
    let mut by_section: BTreeMap<&str, Vec<&ListingRecord>> = BTreeMap::new();
    for record in &summary.records {
        by_section
            .entry(record.section_type.as_str())
            .or_default()
            .push(record);
    }

    for (section, records) in by_section {
        report.push_str(&format!("## {}\n", section.cyan().bold()));
        report.push_str(&format!("  {} listings\n\n", records.len()));
        for record in records {
            report.push_str(&format!(
                "  {} {} {}\n",
                record.price.green(),
                record.title,
                format!("({})", record.location).bright_black()
            ));
        }
        report.push('\n');
    }

    report
}
