// Spreadsheet export of scraped listings

use marketscrape_scanner::{FIELD_NAMES, ListingRecord};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_EXPORT_FILE: &str = "marketplace_products.xlsx";
pub const SHEET_NAME: &str = "Products";
/// Longest string a worksheet cell accepts
pub const MAX_CELL_CHARS: usize = 32_767;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No listings to export")]
    Empty,

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl ExportFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Write every record to `path`, one row per record and one column per
/// field. Returns the number of rows written.
pub fn export_listings(
    records: &[ListingRecord],
    path: &Path,
    format: ExportFormat,
) -> Result<usize, ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }

    match format {
        ExportFormat::Xlsx => write_xlsx(records, path)?,
        ExportFormat::Csv => write_csv(records, path)?,
        ExportFormat::Json => write_json(records, path)?,
    }

    info!(
        "Exported {} listings to {} ({})",
        records.len(),
        path.display(),
        format.extension()
    );
    Ok(records.len())
}

fn write_xlsx(records: &[ListingRecord], path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in FIELD_NAMES.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }
    for (row, record) in records.iter().enumerate() {
        for (col, value) in record.values().iter().enumerate() {
            sheet.write_string(row as u32 + 1, col as u16, cell_text(value))?;
        }
    }
    sheet.autofit();

    workbook.save(path)?;
    Ok(())
}

/// Cut `value` down to what a cell can hold
pub fn cell_text(value: &str) -> &str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

fn write_csv(records: &[ListingRecord], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(FIELD_NAMES)?;
    for record in records {
        writer.write_record(record.values())?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(records: &[ListingRecord], path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    Ok(())
}
