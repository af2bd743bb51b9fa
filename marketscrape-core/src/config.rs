use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const MIN_INTERVAL_SECS: i64 = 1;
pub const MAX_INTERVAL_SECS: i64 = 60;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 1000;

pub const DEFAULT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_LIMIT: usize = 100;

/// Rejected run configuration. The display strings are shown verbatim to
/// the user.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Scraping interval must be at least 1 second")]
    IntervalTooShort,

    #[error("Scraping interval cannot exceed 60 seconds")]
    IntervalTooLong,

    #[error("Scraping limit must be at least 1")]
    LimitTooSmall,

    #[error("Scraping limit cannot exceed 1000")]
    LimitTooLarge,
}

/// Validated settings for one scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    interval_secs: u64,
    limit: usize,
}

impl RunConfig {
    /// Validate raw inputs. The interval is checked before the limit, so
    /// only the first problem is reported.
    pub fn new(interval_secs: i64, limit: i64) -> Result<Self, ConfigError> {
        if interval_secs < MIN_INTERVAL_SECS {
            return Err(ConfigError::IntervalTooShort);
        }
        if interval_secs > MAX_INTERVAL_SECS {
            return Err(ConfigError::IntervalTooLong);
        }
        if limit < MIN_LIMIT {
            return Err(ConfigError::LimitTooSmall);
        }
        if limit > MAX_LIMIT {
            return Err(ConfigError::LimitTooLarge);
        }

        Ok(Self {
            interval_secs: interval_secs as u64,
            limit: limit as usize,
        })
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Read a numeric text input the way a browser number field is read:
/// leading whitespace and an optional sign, then as many digits as are
/// present. Anything else counts as 0.
pub fn parse_number_input(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end].parse::<i64>().unwrap_or(if end == 0 { 0 } else { i64::MAX });

    if negative { -value } else { value }
}
