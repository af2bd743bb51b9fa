// Tests for run configuration validation

use marketscrape_core::config::{ConfigError, DEFAULT_INTERVAL_SECS, DEFAULT_LIMIT, RunConfig};

// ============================================================================
// Interval Bounds
// ============================================================================

#[test]
fn test_interval_lower_bound_accepted() {
    assert!(RunConfig::new(1, 100).is_ok());
}

#[test]
fn test_interval_upper_bound_accepted() {
    assert!(RunConfig::new(60, 100).is_ok());
}

#[test]
fn test_interval_zero_rejected() {
    assert_eq!(RunConfig::new(0, 100), Err(ConfigError::IntervalTooShort));
}

#[test]
fn test_interval_negative_rejected() {
    assert_eq!(RunConfig::new(-5, 100), Err(ConfigError::IntervalTooShort));
}

#[test]
fn test_interval_above_sixty_rejected() {
    assert_eq!(RunConfig::new(61, 100), Err(ConfigError::IntervalTooLong));
}

// ============================================================================
// Limit Bounds
// ============================================================================

#[test]
fn test_limit_bounds_accepted() {
    assert!(RunConfig::new(5, 1).is_ok());
    assert!(RunConfig::new(5, 1000).is_ok());
}

#[test]
fn test_limit_zero_rejected() {
    assert_eq!(RunConfig::new(5, 0), Err(ConfigError::LimitTooSmall));
}

#[test]
fn test_limit_above_thousand_rejected() {
    assert_eq!(RunConfig::new(5, 1001), Err(ConfigError::LimitTooLarge));
}

#[test]
fn test_every_valid_pair_accepted() {
    for interval in 1..=60 {
        for limit in [1, 2, 10, 100, 999, 1000] {
            let config = RunConfig::new(interval, limit).unwrap();
            assert_eq!(config.interval_secs(), interval as u64);
            assert_eq!(config.limit(), limit as usize);
        }
    }
}

// ============================================================================
// Messages and Ordering
// ============================================================================

#[test]
fn test_interval_checked_before_limit() {
    assert_eq!(RunConfig::new(0, 0), Err(ConfigError::IntervalTooShort));
    assert_eq!(RunConfig::new(61, 5000), Err(ConfigError::IntervalTooLong));
}

#[test]
fn test_error_messages() {
    assert_eq!(
        ConfigError::IntervalTooShort.to_string(),
        "Scraping interval must be at least 1 second"
    );
    assert_eq!(
        ConfigError::IntervalTooLong.to_string(),
        "Scraping interval cannot exceed 60 seconds"
    );
    assert_eq!(
        ConfigError::LimitTooSmall.to_string(),
        "Scraping limit must be at least 1"
    );
    assert_eq!(
        ConfigError::LimitTooLarge.to_string(),
        "Scraping limit cannot exceed 1000"
    );
}

#[test]
fn test_defaults() {
    let config = RunConfig::default();
    assert_eq!(config.interval_secs(), DEFAULT_INTERVAL_SECS);
    assert_eq!(config.limit(), DEFAULT_LIMIT);
    assert_eq!(
        RunConfig::new(DEFAULT_INTERVAL_SECS as i64, DEFAULT_LIMIT as i64),
        Ok(config)
    );
}
