use crate::app::{App, Focus, LogLevel};
use marketscrape_core::pagination::PageItem;
use marketscrape_scanner::ListingRecord;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table, Wrap},
};

const TABLE_HEADERS: [&str; 10] = [
    "Title",
    "Price",
    "Section Type",
    "Description",
    "Location",
    "Seller Name",
    "Seller Profile",
    "Listing Link",
    "Latitude",
    "Longitude",
];

fn table_cells(record: &ListingRecord) -> [&str; 10] {
    [
        &record.title,
        &record.price,
        &record.section_type,
        &record.description,
        &record.location,
        &record.seller_name,
        &record.seller_profile,
        &record.listing_link,
        &record.latitude,
        &record.longitude,
    ]
}

pub fn render(f: &mut Frame, app: &App) {
    let error_height = if app.error().is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Inputs
            Constraint::Length(error_height), // Alert
            Constraint::Length(1),            // Actions
            Constraint::Length(4),            // Progress
            Constraint::Min(8),               // Table
            Constraint::Length(1),            // Pagination
            Constraint::Length(7),            // Logs
            Constraint::Length(1),            // Hints
        ])
        .split(f.area());

    render_inputs(f, app, chunks[0]);
    if let Some(error) = app.error() {
        render_error(f, error, chunks[1]);
    }
    render_actions(f, app, chunks[2]);
    render_progress(f, app, chunks[3]);
    render_table(f, app, chunks[4]);
    render_pagination(f, app, chunks[5]);
    render_logs(f, app, chunks[6]);
    render_hints(f, app, chunks[7]);
}

fn render_inputs(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let fields = [
        (" Interval (seconds) ", &app.interval_input, Focus::Interval),
        (" Limit (listings) ", &app.limit_input, Focus::Limit),
    ];

    for ((title, value, focus), column) in fields.into_iter().zip(columns.iter()) {
        let focused = app.focus == focus;
        let border = if app.is_running() {
            Color::DarkGray
        } else if focused {
            Color::Yellow
        } else {
            Color::Gray
        };
        let cursor = if focused && !app.is_running() { "_" } else { "" };

        let input = Paragraph::new(format!("{}{}", value, cursor)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(border)),
        );
        f.render_widget(input, *column);
    }
}

fn render_error(f: &mut Frame, error: &str, area: Rect) {
    let alert = Paragraph::new(error)
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Error ")
                .border_style(Style::default().fg(Color::Red)),
        );
    f.render_widget(alert, area);
}

fn button(label: &str, enabled: bool) -> Span<'static> {
    let style = if enabled {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray).bg(Color::Black)
    };
    Span::styled(format!(" {} ", label), style)
}

fn render_actions(f: &mut Frame, app: &App, area: Rect) {
    let start_label = if app.is_running() {
        "Scraping..."
    } else {
        "Start Scraping"
    };

    let mut spans = vec![
        button(start_label, app.can_start()),
        Span::raw("  "),
        button("Export", app.can_export()),
    ];
    if let Some(ref run_id) = app.run_id {
        spans.push(Span::styled(
            format!("  run {}", run_id),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_progress(f: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(area);

    let percent = app.progress().clamp(0.0, 100.0);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .ratio(percent / 100.0)
        .label(format!("{}% Complete", percent.round() as u64));
    f.render_widget(gauge, rows[0]);

    let summary = Paragraph::new(Line::from(vec![
        Span::raw(" Scraped "),
        Span::styled(
            app.processed().to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" of "),
        Span::styled(app.limit().to_string(), Style::default().fg(Color::Yellow)),
        Span::raw(" listings"),
    ]));
    f.render_widget(summary, rows[1]);
}

fn render_table(f: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(TABLE_HEADERS.iter().map(|h| Cell::from(*h))).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = app
        .page_rows()
        .iter()
        .map(|record| Row::new(table_cells(record).map(|value| Cell::from(value.to_string()))))
        .collect();

    let widths = [
        Constraint::Percentage(16),
        Constraint::Percentage(7),
        Constraint::Percentage(9),
        Constraint::Percentage(18),
        Constraint::Percentage(10),
        Constraint::Percentage(9),
        Constraint::Percentage(10),
        Constraint::Percentage(9),
        Constraint::Percentage(6),
        Constraint::Percentage(6),
    ];

    let title = format!(" Listings ({}) ", app.records().len());
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(table, area);
}

fn render_pagination(f: &mut Frame, app: &App, area: Rect) {
    let spans: Vec<Span> = app
        .pagination_items()
        .into_iter()
        .map(|item| match item {
            PageItem::Previous { enabled, .. } => nav_span("‹ Previous", enabled),
            PageItem::Next { enabled, .. } => nav_span("Next ›", enabled),
            PageItem::First => Span::raw(" 1 "),
            PageItem::Last(total) => Span::raw(format!(" {} ", total)),
            PageItem::Ellipsis => Span::styled(" … ", Style::default().fg(Color::DarkGray)),
            PageItem::Page { number, current } => {
                if current {
                    Span::styled(
                        format!("[{}]", number),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw(format!(" {} ", number))
                }
            }
        })
        .collect();

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn nav_span(label: &str, enabled: bool) -> Span<'static> {
    let style = if enabled {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!(" {} ", label), style)
}

fn render_logs(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Logs ")
        .border_style(Style::default().fg(Color::Magenta));

    let inner = block.inner(area);
    f.render_widget(block, area);

    // Always follow the newest lines
    let height = inner.height as usize;
    let skip = app.logs.len().saturating_sub(height);

    let items: Vec<ListItem> = app
        .logs
        .iter()
        .skip(skip)
        .map(|(level, message)| {
            let (prefix, style) = match level {
                LogLevel::Info => ("INFO ", Style::default().fg(Color::Blue)),
                LogLevel::Warn => ("WARN ", Style::default().fg(Color::Yellow)),
                LogLevel::Error => ("ERROR", Style::default().fg(Color::Red)),
            };
            ListItem::new(format!("[{}] {}", prefix, message)).style(style)
        })
        .collect();

    f.render_widget(List::new(items), inner);
}

fn render_hints(f: &mut Frame, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Black).bg(Color::Gray));

    let mut spans = vec![
        key(" Tab "),
        Span::raw(" Field  "),
        key(" Enter/s "),
        Span::raw(" Start  "),
        key(" x "),
        Span::raw(" Export  "),
        key(" ←/→ "),
        Span::raw(" Page  "),
        key(" Home/End "),
        Span::raw(" First/Last  "),
    ];
    if app.is_running() {
        spans.push(key(" Ctrl+C "));
        spans.push(Span::raw(" Quit"));
    } else {
        spans.push(key(" q/ESC "));
        spans.push(Span::raw(" Quit"));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::Black).fg(Color::Gray));
    f.render_widget(paragraph, area);
}
