//! Attribute aggregation across differently shaped markup regions
//!
//! Detail pages list technical data as definition lists, as label elements
//! followed by a value element, or as key/value containers, and the same key
//! often shows up in more than one region. Regions are scanned in that order
//! and the first value observed for a key is kept.

use anyhow::Result;
use scraper::{ElementRef, Selector};
use std::collections::BTreeMap;
use tracing::debug;

use super::config::AttributeSelectors;
use super::extractors::{compile_group, element_text};

/// Builds the `attributes` mapping of a vehicle record
#[derive(Debug, Clone)]
pub struct AttributeAggregator {
    sibling_labels: Selector,
    sibling_value: Selector,
    pair_container: Selector,
    pair_key: Selector,
    pair_value: Selector,
}

impl AttributeAggregator {
    pub fn new(selectors: &AttributeSelectors) -> Result<Self> {
        Ok(Self {
            sibling_labels: compile_group(&selectors.sibling_labels)?,
            sibling_value: compile_group(&selectors.sibling_value)?,
            pair_container: compile_group(&selectors.pair_container)?,
            pair_key: compile_group(&selectors.pair_key)?,
            pair_value: compile_group(&selectors.pair_value)?,
        })
    }

    /// Collect every non-empty key/value pair, first occurrence wins
    pub fn aggregate(&self, scope: ElementRef<'_>) -> BTreeMap<String, String> {
        let labelled = scope
            .select(&self.sibling_labels)
            .filter_map(|label| Some((element_text(label), self.sibling_value_of(label)?)));

        let paired = scope
            .select(&self.pair_container)
            .filter_map(|container| self.pair_of(container));

        let attributes = labelled
            .chain(paired)
            .filter(|(key, value)| !key.is_empty() && !value.is_empty())
            .fold(BTreeMap::new(), |mut attributes, (key, value)| {
                attributes.entry(key).or_insert(value);
                attributes
            });

        debug!("Aggregated {} attributes", attributes.len());
        attributes
    }

    /// Value for a label: the next element sibling (a `dd` when the label is
    /// a `dt`), else a following sibling marked as feature value
    fn sibling_value_of(&self, label: ElementRef<'_>) -> Option<String> {
        let mut siblings = label.next_siblings().filter_map(ElementRef::wrap);
        let is_term = label.value().name() == "dt";

        let direct = siblings
            .next()
            .filter(|next| !is_term || next.value().name() == "dd")
            .map(element_text)
            .filter(|text| !text.is_empty());

        direct.or_else(|| {
            label
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sibling| self.sibling_value.matches(sibling))
                .map(element_text)
                .filter(|text| !text.is_empty())
        })
    }

    fn pair_of(&self, container: ElementRef<'_>) -> Option<(String, String)> {
        let key = container.select(&self.pair_key).next().map(element_text)?;
        let value = container.select(&self.pair_value).next().map(element_text)?;
        Some((key, value))
    }
}
