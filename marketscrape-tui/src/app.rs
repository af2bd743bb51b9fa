use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use marketscrape_core::config::{RunConfig, parse_number_input};
use marketscrape_core::export::{ExportFormat, export_listings};
use marketscrape_core::pagination::{self, PageItem};
use marketscrape_scanner::ListingRecord;
use std::path::{Path, PathBuf};

/// Shown for any failure of a whole run
pub const RUN_FAILED_MESSAGE: &str = "An error occurred during scraping. Please try again.";

const MAX_LOG_LINES: usize = 500;

/// Message types for communication between a scrape task and the TUI
#[derive(Debug, Clone)]
pub enum ScrapeMessage {
    /// Run started with ID
    Started { run_id: String },
    /// Progress after a feed pass
    Progress { processed: usize, limit: usize },
    /// A listing was scraped
    Listing(ListingRecord),
    /// Log message
    Log { level: LogLevel, message: String },
    /// Run finished normally
    Complete { total: usize },
    /// Run ended with an error
    Failed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Interval,
    Limit,
}

/// UI state: inputs, run lifecycle, results and the table page.
pub struct App {
    pub(crate) interval_input: String,
    pub(crate) limit_input: String,
    pub(crate) focus: Focus,
    error: Option<String>,
    state: RunState,
    processed: usize,
    limit: usize,
    progress: f64,
    records: Vec<ListingRecord>,
    current_page: usize,
    pub(crate) logs: Vec<(LogLevel, String)>,
    pub(crate) run_id: Option<String>,
    export_path: PathBuf,
    should_quit: bool,
}

impl App {
    pub fn new(export_path: PathBuf) -> Self {
        let defaults = RunConfig::default();
        Self {
            interval_input: defaults.interval_secs().to_string(),
            limit_input: defaults.limit().to_string(),
            focus: Focus::Interval,
            error: None,
            state: RunState::Idle,
            processed: 0,
            limit: defaults.limit(),
            progress: 0.0,
            records: Vec::new(),
            current_page: 1,
            logs: Vec::new(),
            run_id: None,
            export_path,
            should_quit: false,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Percentage of the limit processed so far
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    pub fn can_start(&self) -> bool {
        !self.is_running() && self.error.is_none()
    }

    pub fn can_export(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn add_log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.logs.push((level, message.into()));
        // Keep only the most recent lines
        if self.logs.len() > MAX_LOG_LINES {
            self.logs.drain(0..self.logs.len() - MAX_LOG_LINES);
        }
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            Focus::Interval => &mut self.interval_input,
            Focus::Limit => &mut self.limit_input,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Interval => Focus::Limit,
            Focus::Limit => Focus::Interval,
        };
    }

    /// Type into the focused input. Inputs are locked while running.
    pub fn input_char(&mut self, c: char) {
        if self.is_running() || !c.is_ascii_digit() {
            return;
        }
        self.focused_input().push(c);
        self.error = None;
    }

    pub fn backspace(&mut self) {
        if self.is_running() {
            return;
        }
        self.focused_input().pop();
        self.error = None;
    }

    pub fn interval_value(&self) -> i64 {
        parse_number_input(&self.interval_input)
    }

    pub fn limit_value(&self) -> i64 {
        parse_number_input(&self.limit_input)
    }

    // ------------------------------------------------------------------
    // Run lifecycle
    // ------------------------------------------------------------------

    /// Validate the inputs and, if they pass, reset the session for a new
    /// run. Returns the configuration the run should use.
    pub fn start(&mut self) -> Option<RunConfig> {
        if !self.can_start() {
            return None;
        }

        let config = match RunConfig::new(self.interval_value(), self.limit_value()) {
            Ok(config) => config,
            Err(e) => {
                self.error = Some(e.to_string());
                return None;
            }
        };

        self.state = RunState::Running;
        self.records.clear();
        self.processed = 0;
        self.progress = 0.0;
        self.current_page = 1;
        self.limit = config.limit();
        self.run_id = None;
        self.add_log(
            LogLevel::Info,
            format!(
                "Starting scrape: every {}s, up to {} listings",
                config.interval_secs(),
                config.limit()
            ),
        );
        Some(config)
    }

    pub fn handle_message(&mut self, message: ScrapeMessage) {
        match message {
            ScrapeMessage::Started { run_id } => {
                self.add_log(LogLevel::Info, format!("Run {} started", run_id));
                self.run_id = Some(run_id);
            }
            ScrapeMessage::Progress { processed, limit } => {
                self.processed = processed;
                if limit > 0 {
                    self.limit = limit;
                    self.progress = (processed as f64 / limit as f64 * 100.0).min(100.0);
                }
            }
            ScrapeMessage::Listing(record) => {
                self.add_log(LogLevel::Info, format!("Scraped: {}", record.title));
                self.records.push(record);
            }
            ScrapeMessage::Log { level, message } => self.add_log(level, message),
            ScrapeMessage::Complete { total } => {
                self.finish();
                self.add_log(
                    LogLevel::Info,
                    format!("Scrape complete: {} listings", total),
                );
            }
            ScrapeMessage::Failed { reason } => {
                self.finish();
                self.error = Some(RUN_FAILED_MESSAGE.to_string());
                self.add_log(LogLevel::Error, reason);
            }
        }
    }

    fn finish(&mut self) {
        self.state = RunState::Idle;
        self.progress = 100.0;
    }

    /// Write every record to the export path. Does nothing while the
    /// result set is empty.
    pub fn export(&mut self) {
        if !self.can_export() {
            return;
        }

        let format = ExportFormat::from_path(&self.export_path).unwrap_or_default();
        match export_listings(&self.records, &self.export_path, format) {
            Ok(rows) => {
                let message = format!("Exported {} listings to {}", rows, self.export_path.display());
                self.add_log(LogLevel::Info, message);
            }
            Err(e) => self.add_log(LogLevel::Error, format!("Export failed: {}", e)),
        }
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    pub fn total_pages(&self) -> usize {
        pagination::total_pages(self.records.len())
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = pagination::clamp_page(page, self.total_pages());
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.current_page + 1);
    }

    pub fn previous_page(&mut self) {
        self.go_to_page(self.current_page.saturating_sub(1));
    }

    pub fn page_rows(&self) -> &[ListingRecord] {
        pagination::page_slice(&self.records, self.current_page)
    }

    pub fn pagination_items(&self) -> Vec<PageItem> {
        pagination::pagination_items(self.current_page, self.total_pages())
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    /// Apply a key press. Returns a configuration when a run should start.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<RunConfig> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                if !self.is_running() {
                    self.should_quit = true;
                }
            }
            KeyCode::Tab | KeyCode::BackTab => self.toggle_focus(),
            KeyCode::Char(c) if c.is_ascii_digit() => self.input_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Enter | KeyCode::Char('s') => return self.start(),
            KeyCode::Char('x') => self.export(),
            KeyCode::Left => self.previous_page(),
            KeyCode::Right => self.next_page(),
            KeyCode::Home => self.go_to_page(1),
            KeyCode::End => self.go_to_page(self.total_pages()),
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;
    use marketscrape_core::export::DEFAULT_EXPORT_FILE;
    use tempfile::tempdir;

    fn app() -> App {
        App::new(PathBuf::from(DEFAULT_EXPORT_FILE))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn record(title: &str) -> ListingRecord {
        ListingRecord {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn set_inputs(app: &mut App, interval: &str, limit: &str) {
        app.interval_input = interval.to_string();
        app.limit_input = limit.to_string();
    }

    #[test]
    fn test_defaults() {
        let app = app();
        assert_eq!(app.interval_value(), 5);
        assert_eq!(app.limit_value(), 100);
        assert_eq!(app.state(), RunState::Idle);
        assert!(app.can_start());
        assert!(!app.can_export());
    }

    #[test]
    fn test_invalid_interval_blocks_start() {
        let mut app = app();
        set_inputs(&mut app, "0", "100");

        assert!(app.start().is_none());
        assert_eq!(app.error(), Some("Scraping interval must be at least 1 second"));
        assert!(!app.can_start());
        assert_eq!(app.state(), RunState::Idle);

        // Still blocked until an input is edited
        assert!(app.start().is_none());
    }

    #[test]
    fn test_interval_reported_before_limit() {
        let mut app = app();
        set_inputs(&mut app, "61", "5000");
        app.start();
        assert_eq!(app.error(), Some("Scraping interval cannot exceed 60 seconds"));

        set_inputs(&mut app, "5", "5000");
        app.error = None;
        app.start();
        assert_eq!(app.error(), Some("Scraping limit cannot exceed 1000"));
    }

    #[test]
    fn test_editing_clears_error() {
        let mut app = app();
        set_inputs(&mut app, "5", "0");
        app.start();
        assert_eq!(app.error(), Some("Scraping limit must be at least 1"));

        app.focus = Focus::Limit;
        app.input_char('7');
        assert_eq!(app.error(), None);
        assert_eq!(app.limit_value(), 7);
    }

    #[test]
    fn test_empty_input_counts_as_zero() {
        let mut app = app();
        app.backspace();
        assert_eq!(app.interval_value(), 0);
        assert!(app.start().is_none());
        assert_eq!(app.error(), Some("Scraping interval must be at least 1 second"));
    }

    #[test]
    fn test_start_resets_session() {
        let mut app = app();
        app.records.push(record("old"));
        app.current_page = 3;
        app.progress = 100.0;

        let config = app.start().unwrap();

        assert_eq!(config, RunConfig::new(5, 100).unwrap());
        assert!(app.is_running());
        assert!(app.records().is_empty());
        assert_eq!(app.progress(), 0.0);
        assert_eq!(app.current_page(), 1);
        assert!(!app.can_start());
        assert!(app.start().is_none());
    }

    #[test]
    fn test_inputs_locked_while_running() {
        let mut app = app();
        app.start();
        app.input_char('9');
        app.backspace();
        assert_eq!(app.interval_value(), 5);
    }

    #[test]
    fn test_progress_and_completion() {
        let mut app = app();
        set_inputs(&mut app, "1", "4");
        app.start();

        app.handle_message(ScrapeMessage::Progress { processed: 1, limit: 4 });
        assert_eq!(app.progress(), 25.0);
        assert_eq!(app.processed(), 1);

        app.handle_message(ScrapeMessage::Listing(record("Desk")));
        app.handle_message(ScrapeMessage::Complete { total: 1 });

        assert_eq!(app.state(), RunState::Idle);
        assert_eq!(app.progress(), 100.0);
        assert_eq!(app.records().len(), 1);
        assert!(app.can_start());
        assert!(app.can_export());
    }

    #[test]
    fn test_failure_shows_generic_message() {
        let mut app = app();
        app.start();

        app.handle_message(ScrapeMessage::Failed {
            reason: "WebDriver command failed: session gone".to_string(),
        });

        assert_eq!(app.state(), RunState::Idle);
        assert_eq!(app.progress(), 100.0);
        assert_eq!(app.error(), Some(RUN_FAILED_MESSAGE));
        assert!(!app.can_start());
        assert_eq!(app.logs.last().unwrap().0, LogLevel::Error);
    }

    #[test]
    fn test_pagination_over_twenty_five_records() {
        let mut app = app();
        for i in 0..25 {
            app.records.push(record(&format!("Listing {}", i)));
        }

        assert_eq!(app.total_pages(), 3);
        assert_eq!(app.page_rows().len(), 10);

        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.current_page(), 2);
        assert_eq!(app.page_rows()[0].title, "Listing 10");

        app.handle_key(key(KeyCode::End));
        assert_eq!(app.current_page(), 3);
        assert_eq!(app.page_rows().len(), 5);

        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.current_page(), 3);

        app.handle_key(key(KeyCode::Home));
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.current_page(), 1);
    }

    #[test]
    fn test_paging_does_not_touch_run_state() {
        let mut app = app();
        app.start();
        app.handle_message(ScrapeMessage::Listing(record("a")));
        app.handle_key(key(KeyCode::Right));
        assert!(app.is_running());
        assert_eq!(app.records().len(), 1);
    }

    #[test]
    fn test_keys_start_and_quit() {
        let mut app = app();
        assert!(app.handle_key(key(KeyCode::Char('s'))).is_some());

        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.should_quit(), "quit is ignored while running");

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
    }

    #[test]
    fn test_tab_switches_focused_input() {
        let mut app = app();
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(key(KeyCode::Char('5')));
        assert_eq!(app.limit_value(), 105);
        assert_eq!(app.interval_value(), 5);
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut app = App::new(path.clone());

        app.export();
        assert!(!path.exists());

        app.records.push(record("Lamp"));
        app.handle_key(key(KeyCode::Char('x')));

        assert!(path.exists());
        assert!(app.logs.last().unwrap().1.starts_with("Exported 1 listings"));
    }
}
