pub mod crawler;
pub mod error;
pub mod extractor;
pub mod page;
pub mod result;
pub mod selectors;
pub mod snapshot;
pub mod wait;
pub mod webdriver;

pub use crawler::{
    Crawler, ListingKey, ProgressCallback, ResultCallback, VisitedSet, WarningCallback,
    new_visited_set,
};
pub use error::ScanError;
pub use page::Page;
pub use result::{FIELD_NAMES, ListingRecord, NOT_AVAILABLE, UNKNOWN};
pub use selectors::SelectorTable;
pub use snapshot::SnapshotSite;
pub use wait::{WaitPolicy, WaitTimings};
pub use webdriver::WebDriverPage;
