use serde::{Deserialize, Serialize};

/// A product page exposes at most this many gallery images.
pub const MAX_IMAGES: usize = 5;

/// The structured result of scraping one product detail page.
///
/// Image entries hold the gallery URL until the download step rewrites
/// them to the configured-relative local path, or to an empty string
/// when the fetch fails. Every field defaults to empty independently,
/// so a failed lookup degrades only itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub shoe_name: String,
    pub shoe_id: String,
    pub price: String,
    pub discount: String,
    pub color_code: String,
    pub images: Vec<String>,
}

impl ProductRecord {
    /// Image reference for a 0-based slot, empty when the slot was
    /// never populated or its download failed.
    pub fn image(&self, slot: usize) -> &str {
        self.images.get(slot).map(String::as_str).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.shoe_name.is_empty()
            && self.shoe_id.is_empty()
            && self.price.is_empty()
            && self.discount.is_empty()
            && self.color_code.is_empty()
            && self.images.iter().all(String::is_empty)
    }
}
