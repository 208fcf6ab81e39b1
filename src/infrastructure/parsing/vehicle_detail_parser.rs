//! Vehicle detail parser
//!
//! Orchestrates the field extractors, price normalizer, attribute aggregator
//! and dealer parser into one `VehicleRecord`. Extraction failures of any kind
//! stop at `extract`: they are reported to the diagnostics sink and the page
//! yields no record.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

use super::attributes::AttributeAggregator;
use super::config::{AttributeKeySynonyms, ParsingConfig, PriceRangeSelectors};
use super::context::DetailParseContext;
use super::dealer_parser::DealerDetailParser;
use super::diagnostics::{DiagnosticsSink, TracingDiagnostics};
use super::extractors::{
    compile_group, compile_selectors, dedup_ordered, element_text, first_integer,
    harvest_images, image_source, normalize_date, scoped_text, ImageUpscaler, SelectorChain,
};
use super::price::parse_price;
use super::{ContextualParser, ParsingError, ParsingResult};
use crate::domain::vehicle::{Price, PriceRange, PriceRating, VehicleRecord, TITLE_SENTINEL};

static LISTING_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"id=(\d+)").expect("listing id pattern compiles"));

/// Parser for vehicle detail pages
pub struct VehicleDetailParser {
    title: SelectorChain,
    preview_image: SelectorChain,
    price: SelectorChain,
    created_date: SelectorChain,
    modified_date: SelectorChain,
    description: SelectorChain,
    listing_rank: SelectorChain,
    features: Selector,
    image_groups: Vec<Selector>,
    image_source_attributes: Vec<String>,
    upscaler: ImageUpscaler,
    attributes: AttributeAggregator,
    price_rating: SelectorChain,
    price_range: PriceRangeParser,
    dealer: DealerDetailParser,
    attribute_keys: AttributeKeySynonyms,
    known_brands: Vec<String>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

struct PriceRangeParser {
    item: Selector,
    label: Selector,
    min: Selector,
    max: Selector,
}

impl VehicleDetailParser {
    /// Create a new vehicle detail parser with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&ParsingConfig::default())
    }

    /// Create parser with custom configuration, reporting failures through `tracing`
    pub fn with_config(config: &ParsingConfig) -> Result<Self> {
        let selectors = &config.vehicle_detail;

        Ok(Self {
            title: SelectorChain::compile("title", &selectors.title)?,
            preview_image: SelectorChain::compile("preview_image", &selectors.preview_image)?,
            price: SelectorChain::compile("price", &selectors.price)?,
            created_date: SelectorChain::compile("created_date", &selectors.created_date)?,
            modified_date: SelectorChain::compile("modified_date", &selectors.modified_date)?,
            description: SelectorChain::compile("description", &selectors.description)?,
            listing_rank: SelectorChain::compile("listing_rank", &selectors.listing_rank)?,
            features: compile_group(&selectors.features)?,
            image_groups: compile_selectors(&selectors.image_groups)?,
            image_source_attributes: selectors.image_source_attributes.clone(),
            upscaler: ImageUpscaler::from_rule(&config.image_upscale)?,
            attributes: AttributeAggregator::new(&selectors.attributes)?,
            price_rating: SelectorChain::compile("price_rating", &selectors.price_rating)?,
            price_range: PriceRangeParser::new(&selectors.price_range)?,
            dealer: DealerDetailParser::with_config(&config.dealer)?,
            attribute_keys: config.attribute_keys.clone(),
            known_brands: config.known_brands.clone(),
            diagnostics: Arc::new(TracingDiagnostics),
        })
    }

    /// Route extraction failure notices to `diagnostics`
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Build a record, or `None` when extraction failed
    ///
    /// Errors and panics raised while extracting are reported once to the
    /// diagnostics sink together with the source URL; they never reach the
    /// caller, which should skip the page and carry on.
    pub fn extract(&self, html: &Html, context: &DetailParseContext) -> Option<VehicleRecord> {
        self.contained(&context.url, || self.parse_with_context(html, context))
    }

    /// Run `build`, turning its error or panic into one notice for `url`
    fn contained<F>(&self, url: &str, build: F) -> Option<VehicleRecord>
    where
        F: FnOnce() -> ParsingResult<VehicleRecord>,
    {
        let error = match panic::catch_unwind(AssertUnwindSafe(build)) {
            Ok(Ok(record)) => return Some(record),
            Ok(Err(error)) => error,
            Err(payload) => ParsingError::from_panic(payload.as_ref()),
        };

        self.diagnostics.extraction_failed(url, &error);
        None
    }

    fn resolve_attribute(
        attributes: &BTreeMap<String, String>,
        keys: &[String],
    ) -> Option<String> {
        keys.iter().find_map(|key| attributes.get(key).cloned())
    }

    /// First known brand contained in the title, case-insensitively
    fn brand_from_title(&self, title: &str) -> Option<String> {
        let title = title.to_lowercase();
        self.known_brands
            .iter()
            .find(|brand| title.contains(&brand.to_lowercase()))
            .cloned()
    }

    fn extract_preview_image(&self, root: ElementRef<'_>) -> String {
        self.preview_image
            .first_with(root, |element| image_source(element, &self.image_source_attributes))
            .unwrap_or_default()
    }

    fn extract_features(&self, root: ElementRef<'_>) -> Vec<String> {
        dedup_ordered(
            root.select(&self.features)
                .map(element_text)
                .filter(|feature| !feature.is_empty()),
        )
    }

    fn extract_price_rating(&self, root: ElementRef<'_>) -> Option<PriceRating> {
        let rating = self.price_rating.first_text(root)?;
        let price_ranges = self.price_range.extract(root);
        Some(PriceRating {
            rating,
            price_ranges,
        })
    }

    fn extract_listing_id(url: &str) -> Option<u64> {
        LISTING_ID
            .captures(url)
            .and_then(|captures| captures.get(1))
            .and_then(|id| id.as_str().parse().ok())
    }
}

impl ContextualParser for VehicleDetailParser {
    type Output = VehicleRecord;
    type Context = DetailParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        debug!("Parsing vehicle detail from: {}", context.url);

        let url = context.url.trim();
        if url.is_empty() {
            return Err(ParsingError::required_field_missing("url", Some("vehicle detail page")));
        }

        let root = html.root_element();

        let title = self
            .title
            .first_text(root)
            .unwrap_or_else(|| TITLE_SENTINEL.to_string());
        let preview_image = self.extract_preview_image(root);
        let price = self
            .price
            .first_text(root)
            .map(|localized| {
                let amount = parse_price(&localized);
                Price::new(localized, amount)
            });
        let created_date = self
            .created_date
            .first_text(root)
            .and_then(|text| normalize_date(&text));
        let modified_date = self
            .modified_date
            .first_text(root)
            .and_then(|text| normalize_date(&text));

        let attributes = self.attributes.aggregate(root);
        let features = self.extract_features(root);

        let mut images = harvest_images(
            root,
            &self.image_groups,
            &self.image_source_attributes,
            &self.upscaler,
        );
        if images.is_empty() && !preview_image.is_empty() {
            images.push(preview_image.clone());
        }

        let description = self.description.first_text(root);
        let price_rating = self.extract_price_rating(root);
        let dealer_details = self.dealer.extract(root, context.review_limit);

        let id = Self::extract_listing_id(url);
        let rank = self
            .listing_rank
            .first_text(root)
            .and_then(|text| first_integer(&text))
            .filter(|rank| *rank > 0);

        let keys = &self.attribute_keys;
        let brand = Self::resolve_attribute(&attributes, &keys.brand)
            .or_else(|| self.brand_from_title(&title));
        let model = Self::resolve_attribute(&attributes, &keys.model);
        let category = Self::resolve_attribute(&attributes, &keys.category);
        let segment = Self::resolve_attribute(&attributes, &keys.segment);
        let mileage = Self::resolve_attribute(&attributes, &keys.mileage);
        let first_registration = Self::resolve_attribute(&attributes, &keys.first_registration);

        let record = VehicleRecord {
            title,
            url: url.to_string(),
            id,
            rank,
            preview_image,
            images,
            price,
            created_date,
            modified_date,
            description,
            attributes,
            features,
            brand,
            model,
            category,
            segment,
            mileage,
            first_registration,
            dealer_details,
            price_rating,
        };

        debug!(
            "Extracted vehicle '{}' with {} images and {} attributes",
            record.title,
            record.images.len(),
            record.attributes.len()
        );
        Ok(record)
    }
}

impl PriceRangeParser {
    fn new(selectors: &PriceRangeSelectors) -> Result<Self> {
        Ok(Self {
            item: compile_group(&selectors.item)?,
            label: compile_group(&selectors.label)?,
            min: compile_group(&selectors.min)?,
            max: compile_group(&selectors.max)?,
        })
    }

    /// Ranges keyed by label; the first range seen for a label wins
    fn extract(&self, root: ElementRef<'_>) -> Option<BTreeMap<String, PriceRange>> {
        let ranges = root
            .select(&self.item)
            .filter_map(|item| {
                let label = scoped_text(item, &self.label)?;
                let range = PriceRange {
                    start: scoped_text(item, &self.min).and_then(|text| parse_price(&text)),
                    end: scoped_text(item, &self.max).and_then(|text| parse_price(&text)),
                };
                Some((label, range))
            })
            .fold(BTreeMap::new(), |mut ranges, (label, range)| {
                ranges.entry(label).or_insert(range);
                ranges
            });

        (!ranges.is_empty()).then_some(ranges)
    }
}
