pub mod app;
pub mod view;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use marketscrape_core::RunConfig;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

pub use app::{App, LogLevel, RUN_FAILED_MESSAGE, RunState, ScrapeMessage};

/// Starts a scrape in the background. Everything the run produces must be
/// sent over the given channel, ending with `Complete` or `Failed`.
pub type ScrapeLauncher = Box<dyn Fn(RunConfig, mpsc::UnboundedSender<ScrapeMessage>) + Send>;

/// Create a channel pair for scrape messages
pub fn create_scrape_channel() -> (
    mpsc::UnboundedSender<ScrapeMessage>,
    mpsc::UnboundedReceiver<ScrapeMessage>,
) {
    mpsc::unbounded_channel()
}

/// Run the scraper TUI (blocking function, should be run in separate thread)
pub fn run(launcher: ScrapeLauncher, export_path: PathBuf) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(export_path);
    let (tx, mut rx) = create_scrape_channel();

    let result = run_app(&mut terminal, &mut app, &launcher, &tx, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    launcher: &ScrapeLauncher,
    tx: &mpsc::UnboundedSender<ScrapeMessage>,
    rx: &mut mpsc::UnboundedReceiver<ScrapeMessage>,
) -> Result<()> {
    loop {
        // Process all available messages without blocking
        while let Ok(message) = rx.try_recv() {
            app.handle_message(message);
        }

        terminal.draw(|f| view::render(f, app))?;

        if app.should_quit() {
            break;
        }

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(config) = app.handle_key(key)
        {
            launcher(config, tx.clone());
        }
    }

    Ok(())
}
