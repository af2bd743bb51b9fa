use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use marketscrape_core::session::{ScrapeProgressCallback, ScrapeResultCallback};
use marketscrape_core::{
    DEFAULT_EXPORT_FILE, ExportFormat, RunConfig, ScrapeOptions, ScrapeSummary, execute_scrape,
    export_listings, generate_scrape_report,
};
use marketscrape_scanner::{
    ListingRecord, Page, SelectorTable, SnapshotSite, WebDriverPage, new_visited_set,
};
use marketscrape_tui::{LogLevel, ScrapeLauncher, ScrapeMessage};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/marketscrape/";
pub const SELECTORS_FILE: &str = "selectors.json";

/// Expand a leading `~` to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

pub fn default_selectors_path() -> PathBuf {
    expand_path(DEFAULT_CONFIG_DIR).join(SELECTORS_FILE)
}

/// Load the selector table from `explicit` if given, otherwise from the
/// installed config, otherwise fall back to the built-in table.
pub fn load_selectors(explicit: Option<&PathBuf>) -> Result<SelectorTable> {
    load_selectors_from(explicit.map(PathBuf::as_path), &default_selectors_path())
}

pub fn load_selectors_from(explicit: Option<&Path>, installed: &Path) -> Result<SelectorTable> {
    if let Some(path) = explicit {
        return SelectorTable::from_json_file(path)
            .with_context(|| format!("Failed to load selectors from {}", path.display()));
    }

    if installed.exists() {
        info!("Using selectors from {}", installed.display());
        return SelectorTable::from_json_file(installed)
            .with_context(|| format!("Failed to load selectors from {}", installed.display()));
    }

    Ok(SelectorTable::default())
}

/// Write the built-in selector table into `config_dir`, creating it if needed
pub fn install_selectors(config_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;

    let path = config_dir.join(SELECTORS_FILE);
    let json = SelectorTable::default().to_json_pretty()?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Work out the export file and format. An explicit format wins, then the
/// output extension, then xlsx. Without an output the default file name is
/// used with the format's extension.
pub fn resolve_export_target(
    output: Option<&PathBuf>,
    format: Option<&str>,
) -> Result<(PathBuf, ExportFormat)> {
    let format = match format {
        Some(name) => name.parse::<ExportFormat>()?,
        None => output
            .and_then(|path| ExportFormat::from_path(path))
            .unwrap_or_default(),
    };

    let path = match output {
        Some(path) => path.clone(),
        None => PathBuf::from(DEFAULT_EXPORT_FILE).with_extension(format.extension()),
    };

    Ok((path, format))
}

/// Where listings are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    WebDriver(Url),
    Snapshot(PathBuf),
}

pub fn page_source(args: &ArgMatches) -> Result<PageSource> {
    if let Some(dir) = args.get_one::<PathBuf>("snapshot") {
        return Ok(PageSource::Snapshot(dir.clone()));
    }
    match args.get_one::<Url>("webdriver") {
        Some(url) => Ok(PageSource::WebDriver(url.clone())),
        None => bail!("Either --webdriver or --snapshot must be provided"),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .try_init();
}

/// The UI owns the terminal, so logs go to a file instead
fn init_file_logging(path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  MARKETSCRAPE INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let target = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_DIR);
    let force = args.get_flag("force");
    let config_dir = expand_path(target);
    let selectors_path = config_dir.join(SELECTORS_FILE);

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    if selectors_path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A selector table is already installed:");
        println!(
            "  {} {}",
            "•".yellow(),
            selectors_path.display().to_string().bright_white()
        );
        println!();
        println!(
            "{}",
            "This operation will overwrite any edits you made to it.".yellow()
        );

        let response = print_prompt("Do you want to continue? [y/N]:")?;
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
        println!("{} Proceeding with overwrite", "→".yellow().bold());
        println!();
    }

    println!("{} Installing default selector table...", "→".blue());
    let installed = install_selectors(&config_dir)?;
    println!(
        "  {} {}",
        "✓".green().bold(),
        installed.display().to_string().bright_white()
    );

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Config directory: {}",
        "✓".green().bold(),
        config_dir.display().to_string().bright_white()
    );
    println!(
        "{} Edit {} when the marketplace markup changes.",
        "ℹ".blue(),
        SELECTORS_FILE.bright_white()
    );
    println!();
    Ok(())
}

pub async fn handle_scrape(sub_matches: &ArgMatches) -> Result<()> {
    init_stderr_logging();

    let interval = *sub_matches.get_one::<i64>("interval").unwrap_or(&5);
    let limit = *sub_matches.get_one::<i64>("limit").unwrap_or(&100);
    let config = RunConfig::new(interval, limit)?;

    let selectors = load_selectors(sub_matches.get_one::<PathBuf>("selectors"))?;
    let (output, format) = resolve_export_target(
        sub_matches.get_one::<PathBuf>("output"),
        sub_matches.get_one::<String>("format").map(String::as_str),
    )?;
    let start_url = sub_matches.get_one::<Url>("start-url");
    let source = page_source(sub_matches)?;

    println!("\n🛒 Scraping up to {} listings", config.limit());
    println!("Interval: {}s", config.interval_secs());
    match source {
        PageSource::WebDriver(ref url) => println!("WebDriver: {}", url),
        PageSource::Snapshot(ref dir) => println!("Snapshot: {}", dir.display()),
    }
    println!("Export: {} ({})\n", output.display(), format.extension());

    let mut options = ScrapeOptions::new(config);
    options.selectors = selectors;
    options.show_progress_bar = true;

    let summary = match source {
        PageSource::Snapshot(dir) => {
            let site = SnapshotSite::from_dir(&dir)
                .with_context(|| format!("Failed to load snapshot from {}", dir.display()))?;
            scrape_page(Arc::new(site), start_url, options).await?
        }
        PageSource::WebDriver(url) => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner.set_message(format!("Connecting to WebDriver at {}", url));

            let driver = WebDriverPage::connect(url.as_str()).await;
            spinner.finish_and_clear();
            let driver = driver.with_context(|| format!("Could not connect to {}", url))?;

            let outcome = scrape_page(Arc::new(driver.clone()), start_url, options).await;
            if let Err(e) = driver.close().await {
                warn!("Failed to close WebDriver session: {}", e);
            }
            outcome?
        }
    };

    println!("\n{} Scrape complete!\n", "✓".green().bold());
    print!("{}", generate_scrape_report(&summary));

    if summary.records.is_empty() {
        println!("{} Nothing to export", "→".yellow());
        return Ok(());
    }

    let rows = export_listings(&summary.records, &output, format)?;
    println!(
        "{} Exported {} listings to {}",
        "✓".green().bold(),
        rows.to_string().cyan(),
        output.display().to_string().bright_white()
    );
    Ok(())
}

async fn scrape_page<P: Page + 'static>(
    page: Arc<P>,
    start_url: Option<&Url>,
    options: ScrapeOptions,
) -> Result<ScrapeSummary> {
    if let Some(url) = start_url {
        page.goto(url.as_str()).await?;
    }
    Ok(execute_scrape(page, options, None, None).await?)
}

pub async fn handle_ui(sub_matches: &ArgMatches) -> Result<()> {
    let log_file = sub_matches
        .get_one::<PathBuf>("log-file")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("marketscrape.log"));
    init_file_logging(&log_file)?;

    let selectors = load_selectors(sub_matches.get_one::<PathBuf>("selectors"))?;
    let output = sub_matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
    let start_url = sub_matches.get_one::<Url>("start-url").map(Url::to_string);
    let runtime = Handle::current();

    match page_source(sub_matches)? {
        PageSource::Snapshot(dir) => {
            let site = SnapshotSite::from_dir(&dir)
                .with_context(|| format!("Failed to load snapshot from {}", dir.display()))?;
            let launcher = scrape_launcher(Arc::new(site), selectors, start_url, runtime);
            run_tui(launcher, output).await
        }
        PageSource::WebDriver(url) => {
            let driver = WebDriverPage::connect(url.as_str())
                .await
                .with_context(|| format!("Could not connect to {}", url))?;
            let launcher =
                scrape_launcher(Arc::new(driver.clone()), selectors, start_url, runtime);
            let outcome = run_tui(launcher, output).await;
            if let Err(e) = driver.close().await {
                warn!("Failed to close WebDriver session: {}", e);
            }
            outcome
        }
    }
}

async fn run_tui(launcher: ScrapeLauncher, output: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || marketscrape_tui::run(launcher, output)).await?
}

/// Build the launcher the TUI calls on Start. Each run is spawned on
/// `runtime` and reports back over the channel it is handed. Runs share one
/// visited set, so a repeat run on the same feed only picks up new listings.
pub fn scrape_launcher<P: Page + 'static>(
    page: Arc<P>,
    selectors: SelectorTable,
    start_url: Option<String>,
    runtime: Handle,
) -> ScrapeLauncher {
    let visited = new_visited_set();

    Box::new(move |config: RunConfig, tx: UnboundedSender<ScrapeMessage>| {
        let page = page.clone();
        let start_url = start_url.clone();
        let mut options = ScrapeOptions::new(config);
        options.selectors = selectors.clone();
        options.visited = visited.clone();

        let _ = tx.send(ScrapeMessage::Started {
            run_id: options.run_id.to_string(),
        });

        runtime.spawn(async move {
            let message = match run_session(page, start_url.as_deref(), options, tx.clone()).await
            {
                Ok(summary) => ScrapeMessage::Complete {
                    total: summary.records.len(),
                },
                Err(e) => {
                    error!("Scrape failed: {:#}", e);
                    ScrapeMessage::Failed {
                        reason: format!("{:#}", e),
                    }
                }
            };
            let _ = tx.send(message);
        });
    })
}

async fn run_session<P: Page + 'static>(
    page: Arc<P>,
    start_url: Option<&str>,
    mut options: ScrapeOptions,
    tx: UnboundedSender<ScrapeMessage>,
) -> Result<ScrapeSummary> {
    if let Some(url) = start_url {
        let _ = tx.send(ScrapeMessage::Log {
            level: LogLevel::Info,
            message: format!("Opening {}", url),
        });
        page.goto(url).await?;
        // A reloaded feed renders fresh elements
        options.visited.lock().await.clear();
    }

    let warning_tx = tx.clone();
    options.warning_callback = Some(Arc::new(move |message: &str| {
        let _ = warning_tx.send(ScrapeMessage::Log {
            level: LogLevel::Warn,
            message: message.to_string(),
        });
    }));

    let progress_tx = tx.clone();
    let on_progress: ScrapeProgressCallback = Arc::new(move |processed: usize, limit: usize| {
        let _ = progress_tx.send(ScrapeMessage::Progress { processed, limit });
    });
    let on_listing: ScrapeResultCallback = Arc::new(move |record: ListingRecord| {
        let _ = tx.send(ScrapeMessage::Listing(record));
    });

    Ok(execute_scrape(page, options, Some(on_progress), Some(on_listing)).await?)
}
