pub mod config;
pub mod export;
pub mod pagination;
pub mod session;

use colored::Colorize;

pub use config::{ConfigError, RunConfig};
pub use export::{DEFAULT_EXPORT_FILE, ExportError, ExportFormat, export_listings};
pub use session::{ScrapeOptions, ScrapeSummary, execute_scrape, generate_scrape_report};

const BANNER: &str = r#"
                      _        _
  _ __ ___   __ _ _ __| | _____| |_ ___  ___ _ __ __ _ _ __   ___
 | '_ ` _ \ / _` | '__| |/ / _ \ __/ __|/ __| '__/ _` | '_ \ / _ \
 | | | | | | (_| | |  |   <  __/ |_\__ \ (__| | | (_| | |_) |  __/
 |_| |_| |_|\__,_|_|  |_|\_\___|\__|___/\___|_|  \__,_| .__/ \___|
                                                      |_|
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "marketplace listing scraper".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
