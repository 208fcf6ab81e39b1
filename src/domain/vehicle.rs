use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Title used when no title element could be found on a detail page
pub const TITLE_SENTINEL: &str = "No title found";

/// Currency every listing price is reported in
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Seller type reported when the page does not state one
pub const UNKNOWN_SELLER_TYPE: &str = "Unknown";

/// Normalized vehicle listing extracted from a single detail page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub title: String,
    pub url: String,
    /// Numeric listing id embedded in the URL (`id=<digits>`)
    pub id: Option<u64>,
    /// Position of the listing in the search results, when marked on the page
    pub rank: Option<u32>,
    pub preview_image: String,
    pub images: Vec<String>,
    pub price: Option<Price>,
    pub created_date: Option<String>,
    pub modified_date: Option<String>,
    pub description: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub features: Vec<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: Option<String>,
    pub segment: Option<String>,
    pub mileage: Option<String>,
    pub first_registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dealer_details: Option<DealerDetail>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub price_rating: Option<PriceRating>,
}

impl VehicleRecord {
    /// Whether the record carries anything beyond its URL and title
    pub fn has_content(&self) -> bool {
        self.price.is_some()
            || !self.attributes.is_empty()
            || !self.images.is_empty()
            || self.description.is_some()
    }
}

/// Listing price as shown on the page plus its normalized amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// `None` when no number could be isolated from `localized`
    pub amount: Option<f64>,
    pub currency: String,
    pub localized: String,
}

impl Price {
    pub fn new(localized: impl Into<String>, amount: Option<f64>) -> Self {
        Self {
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            localized: localized.into(),
        }
    }
}

/// Seller block of a detail page
///
/// Only built when a dealer name is present; every other field is optional
/// and collections are `None` rather than empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerDetail {
    pub name: String,
    pub seller_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub phones: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub homepage_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<DealerScore>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub active_rating_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reviews: Option<Vec<Review>>,
}

impl DealerDetail {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seller_type: UNKNOWN_SELLER_TYPE.to_string(),
            phones: None,
            address: None,
            email: None,
            homepage_url: None,
            score: None,
            active_rating_count: None,
            reviews: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DealerScore {
    pub total: f64,
}

/// A single customer review of the dealer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub reviewer_name: Option<String>,
    pub total_score: Option<f64>,
    pub review_date: Option<String>,
    pub details: ReviewDetails,
}

impl Review {
    /// Reviews without a reviewer name and without a score carry no signal
    pub fn is_meaningful(&self) -> bool {
        self.reviewer_name.is_some() || self.total_score.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDetails {
    pub liked_text: Option<String>,
    pub disliked_text: Option<String>,
}

/// Marketplace price evaluation ("good price", "fair price", ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRating {
    pub rating: String,
    pub price_ranges: Option<BTreeMap<String, PriceRange>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

/// Links harvested from one search-results page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPageLinks {
    pub listing_links: Vec<String>,
    pub next_page_link: Option<String>,
}

impl SearchPageLinks {
    pub fn is_empty(&self) -> bool {
        self.listing_links.is_empty() && self.next_page_link.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_defaults_to_eur() {
        let price = Price::new("12.500 €", Some(12500.0));
        assert_eq!(price.currency, "EUR");
        assert_eq!(price.localized, "12.500 €");
    }

    #[test]
    fn dealer_without_optional_fields_serializes_compactly() {
        let dealer = DealerDetail::new("Autohaus Nord");
        let json = serde_json::to_value(&dealer).unwrap();

        assert_eq!(json["name"], "Autohaus Nord");
        assert_eq!(json["sellerType"], "Unknown");
        assert!(json.get("phones").is_none());
        assert!(json.get("reviews").is_none());
    }

    #[test]
    fn review_needs_name_or_score() {
        let mut review = Review {
            reviewer_name: None,
            total_score: None,
            review_date: Some("2024-01-01".into()),
            details: ReviewDetails::default(),
        };
        assert!(!review.is_meaningful());

        review.total_score = Some(4.0);
        assert!(review.is_meaningful());
    }
}
