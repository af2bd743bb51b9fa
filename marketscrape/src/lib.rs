// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    PageSource, expand_path, install_selectors, load_selectors, load_selectors_from,
    resolve_export_target, scrape_launcher,
};

// Re-export scrape functionality from marketscrape-core
pub use marketscrape_core::{
    ExportFormat, RunConfig, ScrapeOptions, ScrapeSummary, execute_scrape, export_listings,
    generate_scrape_report,
};
