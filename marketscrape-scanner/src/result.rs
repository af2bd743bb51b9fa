use serde::{Deserialize, Serialize};

/// Placeholder for summary and description fields that could not be read
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder for every other field that could not be read
pub const UNKNOWN: &str = "Unknown";

/// Column names in export order. Matches the field declaration order of
/// [`ListingRecord`].
pub const FIELD_NAMES: [&str; 13] = [
    "title",
    "price",
    "sectionType",
    "location",
    "listingDate",
    "unitDetails",
    "contactInfo",
    "description",
    "sellerName",
    "sellerProfile",
    "listingLink",
    "latitude",
    "longitude",
];

/// One scraped marketplace listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub title: String,
    pub price: String,
    pub section_type: String,
    pub location: String,
    pub listing_date: String,
    pub unit_details: String,
    pub contact_info: String,
    pub description: String,
    pub seller_name: String,
    pub seller_profile: String,
    pub listing_link: String,
    pub latitude: String,
    pub longitude: String,
}

impl ListingRecord {
    /// Field values in the same order as [`FIELD_NAMES`]
    pub fn values(&self) -> [&str; 13] {
        [
            &self.title,
            &self.price,
            &self.section_type,
            &self.location,
            &self.listing_date,
            &self.unit_details,
            &self.contact_info,
            &self.description,
            &self.seller_name,
            &self.seller_profile,
            &self.listing_link,
            &self.latitude,
            &self.longitude,
        ]
    }
}

impl Default for ListingRecord {
    fn default() -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            price: NOT_AVAILABLE.to_string(),
            section_type: NOT_AVAILABLE.to_string(),
            location: UNKNOWN.to_string(),
            listing_date: UNKNOWN.to_string(),
            unit_details: UNKNOWN.to_string(),
            contact_info: UNKNOWN.to_string(),
            description: NOT_AVAILABLE.to_string(),
            seller_name: UNKNOWN.to_string(),
            seller_profile: UNKNOWN.to_string(),
            listing_link: UNKNOWN.to_string(),
            latitude: UNKNOWN.to_string(),
            longitude: UNKNOWN.to_string(),
        }
    }
}
