//! Field extraction primitives shared by all page parsers
//!
//! Selector chains are compiled once at parser construction and evaluated in
//! declaration order; the first selector yielding a non-empty value wins and
//! later selectors are never consulted.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::config::ImageUpscaleRule;
use super::error::ParsingError;

static FIRST_FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("float pattern compiles"));
static FIRST_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("integer pattern compiles"));
static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)").expect("leading float pattern compiles")
});

/// Output shape of every normalized date
const ISO_UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y, %H:%M",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Compile selector strings into Selector objects
///
/// Invalid entries are logged and skipped; an error is returned only when
/// nothing in a non-empty list compiles.
pub fn compile_selectors(selector_strings: &[String]) -> Result<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("Failed to compile selector '{}': {}", selector_str, e);
                errors.push(format!("'{}': {}", selector_str, e));
            }
        }
    }

    if selectors.is_empty() && !selector_strings.is_empty() {
        return Err(anyhow::anyhow!(
            "No valid selectors compiled from {} attempts. Errors: {}",
            selector_strings.len(),
            errors.join(", ")
        ));
    }

    Ok(selectors)
}

/// Compile a single selector group such as `"a.link, a.legacy-link"`
pub fn compile_group(selector_str: &str) -> Result<Selector> {
    Selector::parse(selector_str)
        .map_err(|e| ParsingError::invalid_selector(selector_str, &e.to_string()).into())
}

/// Ordered selector fallback chain for one field
#[derive(Debug, Clone)]
pub struct SelectorChain {
    selectors: Vec<Selector>,
}

impl SelectorChain {
    pub fn compile(field: &'static str, selector_strings: &[String]) -> Result<Self> {
        let selectors = compile_selectors(selector_strings)
            .with_context(|| format!("No usable selector for field '{}'", field))?;
        Ok(Self { selectors })
    }

    /// First element matched by the first selector that matches anything
    pub fn first_element<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).next())
    }

    /// Apply `extract` to each selector's first match until one yields a value
    pub fn first_with<'a, T>(
        &self,
        scope: ElementRef<'a>,
        extract: impl Fn(ElementRef<'a>) -> Option<T>,
    ) -> Option<T> {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).next().and_then(&extract))
    }

    /// Trimmed text of the first selector whose first match is non-empty
    pub fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        let text = self.first_with(scope, |element| {
            let text = element_text(element);
            (!text.is_empty()).then_some(text)
        })?;
        debug!("Extracted selector text: {}", text);
        Some(text)
    }

    /// Trimmed value of `attr` on the first selector match carrying a non-empty one
    pub fn first_attr(&self, scope: ElementRef<'_>, attr: &str) -> Option<String> {
        self.first_with(scope, |element| {
            let value = element.value().attr(attr)?.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
    }
}

/// Concatenated, trimmed text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of every match of `selector` under `scope`, joined and trimmed
pub fn scoped_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let text = scope
        .select(selector)
        .flat_map(|element| element.text())
        .collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Order-preserving deduplication
pub fn dedup_ordered<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    values
        .into_iter()
        .fold(
            (Vec::new(), HashSet::new()),
            |(mut ordered, mut seen), value| {
                if seen.insert(value.clone()) {
                    ordered.push(value);
                }
                (ordered, seen)
            },
        )
        .0
}

/// First non-empty image source attribute, probed in priority order
///
/// Inline `data:` placeholders used by lazy-loading galleries are skipped so
/// the real `data-src` is picked up.
pub fn image_source(element: ElementRef<'_>, attributes: &[String]) -> Option<String> {
    attributes.iter().find_map(|name| {
        let value = element.value().attr(name)?.trim();
        if value.is_empty() || value.starts_with("data:") {
            None
        } else {
            Some(widest_candidate(value))
        }
    })
}

/// Resolve a responsive-image list to its last (widest) URL without descriptor
pub fn widest_candidate(value: &str) -> String {
    let last = value
        .rsplit(',')
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or("");
    last.split_whitespace().next().unwrap_or("").to_string()
}

/// Rewrites CDN image URLs to their largest variant
#[derive(Debug, Clone)]
pub struct ImageUpscaler {
    host_marker: String,
    pattern: Regex,
    replacement: String,
}

impl ImageUpscaler {
    pub fn from_rule(rule: &ImageUpscaleRule) -> Result<Self> {
        Ok(Self {
            host_marker: rule.host_marker.clone(),
            pattern: Regex::new(&rule.pattern)?,
            replacement: rule.replacement.clone(),
        })
    }

    pub fn upscale(&self, url: &str) -> String {
        if url.contains(&self.host_marker) {
            self.pattern
                .replace_all(url, self.replacement.as_str())
                .into_owned()
        } else {
            url.to_string()
        }
    }
}

/// Harvest image URLs from several selector groups
///
/// Each group's matches are appended in document order, then the whole
/// sequence is deduplicated keeping first occurrences.
pub fn harvest_images(
    scope: ElementRef<'_>,
    groups: &[Selector],
    source_attributes: &[String],
    upscaler: &ImageUpscaler,
) -> Vec<String> {
    dedup_ordered(
        groups
            .iter()
            .flat_map(|group| scope.select(group))
            .filter_map(|element| image_source(element, source_attributes))
            .filter(|src| !src.is_empty())
            .map(|src| upscaler.upscale(&src)),
    )
}

/// Parse a date in one of the common site formats into ISO-8601 UTC
pub fn normalize_date(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        });

    match parsed {
        Some(dt) => Some(dt.format(ISO_UTC_FORMAT).to_string()),
        None => {
            debug!("Unrecognized date format: {}", text);
            None
        }
    }
}

/// First float-looking substring, accepting a comma decimal separator
pub fn first_float(text: &str) -> Option<f64> {
    FIRST_FLOAT
        .find(text)
        .and_then(|m| m.as_str().replace(',', ".").parse().ok())
}

/// First run of digits
pub fn first_integer(text: &str) -> Option<u32> {
    FIRST_INTEGER.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Number at the very start of the text, ignoring anything after it
pub fn leading_float(text: &str) -> Option<f64> {
    LEADING_FLOAT
        .find(text.trim_start())
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn chain(field: &'static str, selectors: &[&str]) -> SelectorChain {
        let strings: Vec<String> = selectors.iter().map(ToString::to_string).collect();
        SelectorChain::compile(field, &strings).unwrap()
    }

    #[test]
    fn first_matching_selector_wins() {
        let html = Html::parse_document(
            r#"<h1 class="title">Current</h1><h1 class="legacy">Legacy</h1>"#,
        );
        let title = chain("title", &["h1.title", "h1.legacy"]);
        assert_eq!(title.first_text(html.root_element()).as_deref(), Some("Current"));
    }

    #[test]
    fn empty_match_falls_through_to_next_selector() {
        let html = Html::parse_document(r#"<h1 class="title">   </h1><h1 class="legacy">Legacy</h1>"#);
        let title = chain("title", &["h1.title", "h1.legacy"]);
        assert_eq!(title.first_text(html.root_element()).as_deref(), Some("Legacy"));
    }

    #[test]
    fn later_selectors_are_not_consulted_after_a_match() {
        let html = Html::parse_document(r#"<p id="a">first</p><p id="b">second</p>"#);
        let paragraphs = chain("paragraph", &["#a", "#b"]);
        let element = paragraphs.first_element(html.root_element()).unwrap();
        assert_eq!(element.value().id(), Some("a"));
    }

    #[test]
    fn invalid_selectors_are_skipped_unless_all_fail() {
        let strings = vec!["h1[".to_string(), "h1".to_string()];
        let html = Html::parse_document("<h1>Golf</h1>");
        let compiled = SelectorChain::compile("title", &strings).unwrap();
        assert_eq!(compiled.first_text(html.root_element()).as_deref(), Some("Golf"));

        let broken = vec!["h1[".to_string()];
        let error = SelectorChain::compile("title", &broken).unwrap_err();
        assert!(format!("{:#}", error).contains("'title'"));
    }

    #[test]
    fn attribute_lookup_skips_blank_values() {
        let html = Html::parse_document(
            r#"<img class="main" src=" "><img class="fallback" src="https://img/1.jpg">"#,
        );
        let images = chain("preview_image", &["img.main", "img.fallback"]);
        assert_eq!(
            images.first_attr(html.root_element(), "src").as_deref(),
            Some("https://img/1.jpg")
        );
    }

    #[test]
    fn srcset_resolves_to_widest_entry() {
        assert_eq!(
            widest_candidate("https://img/a-320.jpg 320w, https://img/a-1280.jpg 1280w"),
            "https://img/a-1280.jpg"
        );
        assert_eq!(widest_candidate("https://img/a.jpg"), "https://img/a.jpg");
    }

    #[test]
    fn image_source_prefers_src_then_data_src() {
        let html = Html::parse_document(
            r#"<img id="lazy" src="data:image/gif;base64,R0lG" data-src="https://img/lazy.jpg">
               <img id="set" srcset="https://img/s.jpg 1x, https://img/l.jpg 2x">"#,
        );
        let attrs = vec!["src".to_string(), "data-src".to_string(), "srcset".to_string()];
        let lazy = html.select(&Selector::parse("#lazy").unwrap()).next().unwrap();
        let set = html.select(&Selector::parse("#set").unwrap()).next().unwrap();

        assert_eq!(image_source(lazy, &attrs).as_deref(), Some("https://img/lazy.jpg"));
        assert_eq!(image_source(set, &attrs).as_deref(), Some("https://img/l.jpg"));
    }

    #[test]
    fn cdn_urls_are_upscaled() {
        let upscaler = ImageUpscaler::from_rule(&ImageUpscaleRule::default()).unwrap();
        assert_eq!(
            upscaler.upscale("https://img.classistatic.de/api/v1/mo-prod/images/ab?rule=mo-640.jpg"),
            "https://img.classistatic.de/api/v1/mo-prod/images/ab?rule=mo-1600.jpg"
        );
        assert_eq!(
            upscaler.upscale("https://other.cdn/img?rule=mo-640.jpg"),
            "https://other.cdn/img?rule=mo-640.jpg"
        );
    }

    #[test]
    fn harvested_images_are_deduplicated_across_groups() {
        let html = Html::parse_document(
            r#"<img class="g" src="https://img/1.jpg"><img class="g" src="https://img/2.jpg">
               <picture><source srcset="https://img/1.jpg"></picture>"#,
        );
        let groups = vec![
            Selector::parse("img.g").unwrap(),
            Selector::parse("picture source").unwrap(),
        ];
        let attrs = vec!["src".to_string(), "srcset".to_string()];
        let upscaler = ImageUpscaler::from_rule(&ImageUpscaleRule::default()).unwrap();

        let images = harvest_images(html.root_element(), &groups, &attrs, &upscaler);
        assert_eq!(images, vec!["https://img/1.jpg", "https://img/2.jpg"]);
    }

    #[test]
    fn dates_normalize_to_iso_utc() {
        assert_eq!(
            normalize_date("15.03.2024").as_deref(),
            Some("2024-03-15T00:00:00.000Z")
        );
        assert_eq!(
            normalize_date("2024-03-15T10:20:30+01:00").as_deref(),
            Some("2024-03-15T09:20:30.000Z")
        );
        assert_eq!(
            normalize_date("15.03.2024, 08:05").as_deref(),
            Some("2024-03-15T08:05:00.000Z")
        );
        assert_eq!(normalize_date("yesterday"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn numeric_helpers() {
        assert_eq!(first_float("Rating: 4,7 / 5"), Some(4.7));
        assert_eq!(first_float("4.5 stars"), Some(4.5));
        assert_eq!(first_float("no rating"), None);
        assert_eq!(first_integer("(128 reviews)"), Some(128));
        assert_eq!(leading_float("4.5/5"), Some(4.5));
        assert_eq!(leading_float("Score 4"), None);
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let values = ["b", "a", "b", "c", "a"].map(String::from);
        assert_eq!(dedup_ordered(values), vec!["b", "a", "c"]);
    }
}
