//! Parsing configuration for listing extraction
//!
//! Centralized CSS selectors, attribute-key synonyms and normalization rules.
//! Every `Vec<String>` chain is ordered most-specific first: the current site
//! markup leads and legacy variants trail, and the first selector producing a
//! non-empty value wins. Plain `String` groups are comma-joined selectors
//! whose matches are all consumed in document order.

use serde::{Deserialize, Serialize};

use crate::infrastructure::config::mobile_de;

/// Main parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Origin relative listing links are resolved against
    pub base_url: String,

    /// Search-results page selectors
    pub search_page: SearchPageSelectors,

    /// Vehicle detail page selectors
    pub vehicle_detail: VehicleDetailSelectors,

    /// Dealer and review selectors
    pub dealer: DealerSelectors,

    /// Attribute keys consulted for derived record fields
    pub attribute_keys: AttributeKeySynonyms,

    /// Brand names scanned in the title when no brand attribute exists
    pub known_brands: Vec<String>,

    /// CDN rewrite requesting the largest image variant
    pub image_upscale: ImageUpscaleRule,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            base_url: mobile_de::SEARCH_ORIGIN.to_string(),
            search_page: SearchPageSelectors::default(),
            vehicle_detail: VehicleDetailSelectors::default(),
            dealer: DealerSelectors::default(),
            attribute_keys: AttributeKeySynonyms::default(),
            known_brands: default_known_brands(),
            image_upscale: ImageUpscaleRule::default(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Brand list in match priority order
///
/// `Mercedes` precedes `Mercedes-Benz`, so titles containing the long form
/// report the short one.
fn default_known_brands() -> Vec<String> {
    strings(&[
        "Audi",
        "BMW",
        "Mercedes",
        "Mercedes-Benz",
        "VW",
        "Volkswagen",
        "Porsche",
        "Opel",
        "Ford",
        "Renault",
        "Peugeot",
        "Citroën",
        "Fiat",
        "Toyota",
        "Honda",
        "Nissan",
        "Mazda",
        "Hyundai",
        "Kia",
        "Skoda",
        "Seat",
    ])
}

/// CSS selectors for search-results pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPageSelectors {
    /// Listing anchors, all matches are harvested
    pub listing_link: String,

    /// Next-page anchor chain
    pub next_page: Vec<String>,

    /// Path fragment a listing link must contain
    pub detail_marker: String,
}

impl Default for SearchPageSelectors {
    fn default() -> Self {
        Self {
            listing_link: [
                "a[data-testid=\"listing-link\"]",
                "a.vehicle-link",
                "div.vehicle-data a[href*=\"/details.html\"]",
                "[data-testid=\"result-list-item\"] a[data-testid=\"classified-link\"]",
            ]
            .join(", "),
            next_page: strings(&["a.pagination-next", "a[data-testid=\"pagination-next\"]"]),
            detail_marker: crate::domain::crawl_request::DETAIL_PAGE_MARKER.to_string(),
        }
    }
}

/// CSS selectors for vehicle detail pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleDetailSelectors {
    pub title: Vec<String>,
    pub preview_image: Vec<String>,
    pub price: Vec<String>,
    pub created_date: Vec<String>,
    pub modified_date: Vec<String>,
    pub description: Vec<String>,
    pub listing_rank: Vec<String>,

    /// Equipment list items, all matches are harvested
    pub features: String,

    /// Gallery selector groups, each group's matches are appended in turn
    pub image_groups: Vec<String>,

    /// Attribute names probed for an image source, in priority order
    pub image_source_attributes: Vec<String>,

    /// Attribute regions
    pub attributes: AttributeSelectors,

    /// Price evaluation text
    pub price_rating: Vec<String>,

    /// Price evaluation ranges
    pub price_range: PriceRangeSelectors,
}

impl Default for VehicleDetailSelectors {
    fn default() -> Self {
        Self {
            title: strings(&[
                "h1[data-testid=\"ad-title\"]",
                "h1.title",
                "h1.listing-title",
                ".vehicle-title h1",
                "[data-testid=\"classified-heading\"]",
                "h1",
            ]),
            preview_image: strings(&[
                "img[data-testid=\"main-image\"]",
                "img.main-image",
                ".image-gallery img",
                "picture img",
            ]),
            price: strings(&[
                "span[data-testid=\"price\"]",
                "span.price-value",
                ".price-block .price",
                "div.price-label",
                "[data-testid=\"prime-price\"]",
            ]),
            created_date: strings(&["span[data-testid=\"created-date\"]", ".created-date"]),
            modified_date: strings(&["span[data-testid=\"modified-date\"]", ".modified-date"]),
            description: strings(&[
                "div[data-testid=\"description\"]",
                ".description-text",
                ".ad-description",
                ".vehicle-description",
            ]),
            listing_rank: strings(&["[data-testid=\"listing-rank\"]"]),
            features: [
                "li[data-testid=\"equipment-item\"]",
                ".features-list li",
                ".equipment-list li",
                ".feature-item",
                "[data-testid=\"features-list\"] li",
            ]
            .join(", "),
            image_groups: strings(&[
                "img[data-testid=\"gallery-image\"]",
                "img.gallery-image",
                ".image-gallery img",
                "picture source",
                "img[src*=\"classistatic\"]",
                "[data-testid=\"image-gallery\"] img, .gallery-picture img",
            ]),
            image_source_attributes: strings(&["src", "data-src", "srcset"]),
            attributes: AttributeSelectors::default(),
            price_rating: strings(&[
                "[data-testid=\"price-rating\"]",
                ".price-rating",
                ".price-evaluation",
            ]),
            price_range: PriceRangeSelectors::default(),
        }
    }
}

/// Selectors for the differently shaped attribute regions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSelectors {
    /// Label elements whose value is a following sibling (`dt` → `dd`,
    /// label → next element)
    pub sibling_labels: String,

    /// Sibling carrying the value when the next element is empty
    pub sibling_value: String,

    /// Containers holding both a key element and a value element
    pub pair_container: String,
    pub pair_key: String,
    pub pair_value: String,
}

impl Default for AttributeSelectors {
    fn default() -> Self {
        Self {
            sibling_labels: [
                "div[data-testid=\"feature-label\"]",
                ".vehicle-data-item",
                ".ad-details-item",
                "dl.feature-list dt",
                "[data-testid=\"feature-list\"] dt",
                ".technical-data dt",
            ]
            .join(", "),
            sibling_value: "[data-testid=\"feature-value\"]".to_string(),
            pair_container: ".key-value-pair, .attribute-item".to_string(),
            pair_key: ".key, .label, .attribute-label".to_string(),
            pair_value: ".value, .attribute-value".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRangeSelectors {
    pub item: String,
    pub label: String,
    pub min: String,
    pub max: String,
}

impl Default for PriceRangeSelectors {
    fn default() -> Self {
        Self {
            item: ".price-range-item, [data-testid=\"price-range\"]".to_string(),
            label: ".range-label".to_string(),
            min: ".range-min".to_string(),
            max: ".range-max".to_string(),
        }
    }
}

/// CSS selectors for the seller block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealerSelectors {
    pub name: Vec<String>,
    pub seller_type: Vec<String>,

    /// Phone elements, all matches are harvested (text or `tel:` target)
    pub phone: String,

    pub address: Vec<String>,
    pub email_link: Vec<String>,
    pub website: Vec<String>,
    pub rating: Vec<String>,
    pub review_count: Vec<String>,
    pub review: ReviewSelectors,
}

impl Default for DealerSelectors {
    fn default() -> Self {
        Self {
            name: strings(&[
                "[data-testid=\"seller-name\"]",
                ".dealer-name",
                ".seller-name",
                ".dealer-info h3",
                "[data-testid=\"dealer-name\"]",
            ]),
            seller_type: strings(&["[data-testid=\"seller-type\"]", ".seller-type"]),
            phone: [
                "[data-testid=\"phone-number\"]",
                ".dealer-phone",
                ".phone-number",
                "a[href^=\"tel:\"]",
                "[data-testid=\"dealer-phone\"]",
            ]
            .join(", "),
            address: strings(&[
                "[data-testid=\"seller-address\"]",
                ".dealer-address",
                ".seller-address",
                ".dealer-location",
                "[data-testid=\"dealer-address\"]",
            ]),
            email_link: strings(&["a[href^=\"mailto:\"]"]),
            website: strings(&["[data-testid=\"dealer-website\"]", ".dealer-website a"]),
            rating: strings(&[
                "[data-testid=\"dealer-rating\"]",
                ".dealer-rating",
                ".seller-rating-value",
            ]),
            review_count: strings(&[
                "[data-testid=\"review-count\"]",
                ".review-count",
                ".dealer-reviews-count",
            ]),
            review: ReviewSelectors::default(),
        }
    }
}

/// Selectors scoped to a single review element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSelectors {
    pub item: String,
    pub reviewer_name: String,
    pub score: String,
    pub date: String,
    pub positive: String,
    pub negative: String,
}

impl Default for ReviewSelectors {
    fn default() -> Self {
        Self {
            item: ".review-item, [data-testid=\"review\"]".to_string(),
            reviewer_name: ".reviewer-name, [data-testid=\"reviewer-name\"]".to_string(),
            score: ".review-score, [data-testid=\"review-score\"]".to_string(),
            date: ".review-date, [data-testid=\"review-date\"]".to_string(),
            positive: ".review-positive, [data-testid=\"review-positive\"]".to_string(),
            negative: ".review-negative, [data-testid=\"review-negative\"]".to_string(),
        }
    }
}

/// Attribute keys (English and German page variants) per derived field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeKeySynonyms {
    pub brand: Vec<String>,
    pub model: Vec<String>,
    pub category: Vec<String>,
    pub segment: Vec<String>,
    pub mileage: Vec<String>,
    pub first_registration: Vec<String>,
}

impl Default for AttributeKeySynonyms {
    fn default() -> Self {
        Self {
            brand: strings(&["Brand", "Make", "Marke"]),
            model: strings(&["Model", "Modell"]),
            category: strings(&["Category", "Body Type", "Kategorie"]),
            segment: strings(&["Category", "Vehicle Type", "Fahrzeugtyp"]),
            mileage: strings(&["Mileage", "Kilometerstand"]),
            first_registration: strings(&["First Registration", "Erstzulassung"]),
        }
    }
}

/// Regex rewrite applied to image URLs served from a known CDN
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUpscaleRule {
    /// Only URLs containing this marker are rewritten
    pub host_marker: String,
    pub pattern: String,
    pub replacement: String,
}

impl Default for ImageUpscaleRule {
    fn default() -> Self {
        Self {
            host_marker: "classistatic".to_string(),
            pattern: r"rule=mo-\d+".to_string(),
            replacement: "rule=mo-1600".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let config = ParsingConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: ParsingConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.base_url, "https://suchen.mobile.de");
        assert_eq!(restored.known_brands, config.known_brands);
        assert_eq!(restored.vehicle_detail.title, config.vehicle_detail.title);
    }

    #[test]
    fn image_sources_probe_src_first() {
        let selectors = VehicleDetailSelectors::default();
        assert_eq!(selectors.image_source_attributes, vec!["src", "data-src", "srcset"]);
    }
}
