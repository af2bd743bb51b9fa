use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("WebDriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("WebDriver session could not be started: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Stale element handle: {0}")]
    StaleElement(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
