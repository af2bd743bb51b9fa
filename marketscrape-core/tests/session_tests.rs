// Tests for scrape orchestration and reporting

use marketscrape_core::config::RunConfig;
use marketscrape_core::session::{ScrapeOptions, execute_scrape, generate_scrape_report};
use marketscrape_scanner::{ListingRecord, SelectorTable, SnapshotSite, new_visited_set};
use std::sync::{Arc, Mutex};

const FEED: &str = "https://market.test/feed";

fn selectors() -> SelectorTable {
    SelectorTable {
        listings_container: "feed".to_string(),
        detail_summary: ".summary".to_string(),
        ..Default::default()
    }
}

fn site(count: usize) -> SnapshotSite {
    let cards: String = (1..=count)
        .map(|i| format!(r#"<div><a href="/item/{}">Item {}</a></div>"#, i, i))
        .collect();
    let mut site = SnapshotSite::new().with_page(
        FEED,
        format!(r#"<html><body><div class="feed">{}</div></body></html>"#, cards),
    );
    for i in 1..=count {
        site = site.with_page(
            format!("https://market.test/item/{}", i),
            format!(
                r#"<html><body><div class="summary"><h1>Chair {}</h1><span>${}</span><span>Furniture</span></div></body></html>"#,
                i, i
            ),
        );
    }
    site.starting_at(FEED)
}

fn options(config: RunConfig) -> ScrapeOptions {
    ScrapeOptions {
        selectors: selectors(),
        ..ScrapeOptions::new(config)
    }
}

#[tokio::test(start_paused = true)]
async fn test_execute_scrape_reports_progress_and_results() {
    let progress = Arc::new(Mutex::new(Vec::new()));
    let titles = Arc::new(Mutex::new(Vec::new()));
    let progress_sink = progress.clone();
    let titles_sink = titles.clone();

    let summary = execute_scrape(
        Arc::new(site(4)),
        options(RunConfig::new(1, 3).unwrap()),
        Some(Arc::new(move |processed: usize, limit: usize| {
            progress_sink.lock().unwrap().push((processed, limit));
        })),
        Some(Arc::new(move |record: ListingRecord| {
            titles_sink.lock().unwrap().push(record.title);
        })),
    )
    .await
    .unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.limit, 3);
    assert_eq!(summary.records.len(), 3);
    assert_eq!(*progress.lock().unwrap(), vec![(3, 3)]);
    assert_eq!(*titles.lock().unwrap(), vec!["Chair 1", "Chair 2", "Chair 3"]);
}

#[tokio::test(start_paused = true)]
async fn test_each_run_gets_its_own_id() {
    let first = execute_scrape(Arc::new(site(1)), options(RunConfig::default()), None, None)
        .await
        .unwrap();
    let second = execute_scrape(Arc::new(site(1)), options(RunConfig::default()), None, None)
        .await
        .unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert!(first.finished_at >= first.started_at);
}

#[tokio::test(start_paused = true)]
async fn test_repeat_run_on_same_page_finds_nothing_new() {
    let page = Arc::new(site(2));
    let visited = new_visited_set();

    let first = execute_scrape(
        page.clone(),
        ScrapeOptions {
            visited: visited.clone(),
            ..options(RunConfig::default())
        },
        None,
        None,
    )
    .await
    .unwrap();
    let second = execute_scrape(
        page,
        ScrapeOptions {
            visited: visited.clone(),
            ..options(RunConfig::default())
        },
        None,
        None,
    )
    .await
    .unwrap();

    assert_eq!(first.records.len(), 2);
    assert_eq!(second.records.len(), 0);
    assert_eq!(second.processed, 0);
}

#[tokio::test]
async fn test_execute_scrape_fails_on_broken_feed_selector() {
    let mut options = options(RunConfig::default());
    options.selectors.listings_container = "feed[[".to_string();

    let result = execute_scrape(Arc::new(site(1)), options, None, None).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_report_groups_by_section() {
    colored::control::set_override(false);
    let summary = execute_scrape(Arc::new(site(2)), options(RunConfig::default()), None, None)
        .await
        .unwrap();

    let report = generate_scrape_report(&summary);

    assert!(report.contains(&summary.run_id.to_string()));
    assert!(report.contains("Listings processed: 2 of 100"));
    assert!(report.contains("Listings recorded: 2"));
    assert!(report.contains("## Furniture"));
    assert!(report.contains("$1 Chair 1 (Unknown)"));
}

#[tokio::test]
async fn test_report_for_empty_run() {
    colored::control::set_override(false);
    let site = SnapshotSite::new()
        .with_page(FEED, "<html><body></body></html>")
        .starting_at(FEED);

    let summary = execute_scrape(Arc::new(site), options(RunConfig::default()), None, None)
        .await
        .unwrap();
    let report = generate_scrape_report(&summary);

    assert!(summary.records.is_empty());
    assert!(report.contains("No listings found."));
}
