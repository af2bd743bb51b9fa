//! Every structural selector the scraper depends on, in one table.
//!
//! The marketplace markup uses generated class names that change between
//! site releases. Keeping them here (and loadable from JSON) means markup
//! drift is fixed by editing data rather than extraction code.

use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorTable {
    /// Class list of the feed element whose children are listings
    pub listings_container: String,
    /// CSS for the clickable link inside a listing child
    pub listing_link: String,
    /// CSS for the detail-view element holding title, price and section
    pub detail_summary: String,
    /// Class list of the spans that may hold the "see more" toggle
    pub description_toggle: String,
    pub see_more_label: String,
    pub see_less_label: String,
    /// CSS for the element wrapping the description text
    pub description_body: String,
    /// CSS for the description text inside `description_body`
    pub description_text: String,
    /// Class list of the detail-view blocks, one of which holds the location
    pub location_blocks: String,
    pub location_index: usize,
    pub location_text: String,
    /// Class list of the elements scanned for the seller anchor
    pub seller_candidates: String,
    pub seller_anchor: String,
    /// `aria-label` identifying the seller anchor
    pub seller_anchor_label: String,
    /// CSS for the seller name on the seller profile view
    pub seller_profile_name: String,
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            listings_container:
                "x8gbvx8 x78zum5 x1q0g3np x1a02dak x1nhvcw1 x1rdy4ex xcud41i x4vbgl9 x139jcc6"
                    .to_string(),
            listing_link: "a[href]".to_string(),
            detail_summary: ".xyamay9.x1pi30zi.x18d9i69.x1swvt13".to_string(),
            description_toggle:
                "x193iq5w xeuugli x13faqbe x1vvkbs x1xmvt09 x6prxxf xvq8zen x1s688f xzsf02u"
                    .to_string(),
            see_more_label: "see more".to_string(),
            see_less_label: "see less".to_string(),
            description_body: "div.xz9dl7a.x4uap5.xsag5q8.xkhd6sd.x126k92a".to_string(),
            description_text: "span".to_string(),
            location_blocks: "x889kno x1pi30zi x1a8lsjc x1swvt13".to_string(),
            location_index: 2,
            location_text: "span".to_string(),
            seller_candidates:
                "x9f619 x1ja2u2z x78zum5 x2lah0s x1n2onr6 x1qughib x1qjc9v5 xozqiw3 x1q0g3np"
                    .to_string(),
            seller_anchor: "a".to_string(),
            seller_anchor_label: "Seller details".to_string(),
            seller_profile_name: ".x193iq5w.xeuugli.x13faqbe.x1vvkbs.x1xmvt09.x1lliihq.x1s928wv.xhkezso.x1gmr53x.x1cpjm7i.x1fgarty.x1943h6x.x14qwyeo.xw06pyt.x579bpy.xjkpybl.x1xlr1w8.xzsf02u.x1yc453h".to_string(),
        }
    }
}

impl SelectorTable {
    /// Load a table from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let table: SelectorTable = serde_json::from_str(content)?;
        table.validate()?;
        Ok(table)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every selector must be non-empty and every CSS selector must parse
    pub fn validate(&self) -> Result<()> {
        let class_lists = [
            ("listings_container", &self.listings_container),
            ("description_toggle", &self.description_toggle),
            ("location_blocks", &self.location_blocks),
            ("seller_candidates", &self.seller_candidates),
        ];
        for (name, classes) in class_lists {
            if classes.split_whitespace().next().is_none() {
                return Err(ScanError::InvalidSelector(format!("{} is empty", name)));
            }
        }

        let css = [
            ("listing_link", self.listing_link.as_str()),
            ("detail_summary", self.detail_summary.as_str()),
            ("description_body", self.description_body.as_str()),
            ("description_text", self.description_text.as_str()),
            ("location_text", self.location_text.as_str()),
            ("seller_anchor", self.seller_anchor.as_str()),
            ("seller_profile_name", self.seller_profile_name.as_str()),
        ];
        for (name, selector) in css {
            scraper::Selector::parse(selector)
                .map_err(|e| ScanError::InvalidSelector(format!("{}: {:?}", name, e)))?;
        }

        Ok(())
    }

    pub fn listings_container_css(&self) -> String {
        class_selector(&self.listings_container)
    }

    pub fn description_toggle_css(&self) -> String {
        class_selector(&self.description_toggle)
    }

    pub fn location_blocks_css(&self) -> String {
        class_selector(&self.location_blocks)
    }

    pub fn seller_candidates_css(&self) -> String {
        class_selector(&self.seller_candidates)
    }
}

/// Turn a space-separated class list into a compound CSS class selector,
/// matching the same elements `getElementsByClassName` would.
pub fn class_selector(classes: &str) -> String {
    classes
        .split_whitespace()
        .map(|class| format!(".{}", class))
        .collect()
}
