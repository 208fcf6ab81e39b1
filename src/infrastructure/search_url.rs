//! Search URL construction from scraper input filters

use url::form_urlencoded;

use crate::infrastructure::config::mobile_de::{
    params, DEFAULT_SORT_ORDER, SEARCH_PAGE_URL, SORT_ORDERS,
};
use crate::infrastructure::config::ScraperInput;

/// `sb` value for an input sort key, `rel` for relevance or unknown keys
pub fn sort_parameter(sort: &str) -> &'static str {
    SORT_ORDERS
        .iter()
        .find(|(key, _)| *key == sort)
        .map_or(DEFAULT_SORT_ORDER, |(_, value)| *value)
}

fn positive(value: Option<u32>) -> Option<u32> {
    value.filter(|v| *v > 0)
}

/// Build the search-results URL for the given filters
///
/// Unset or zero-valued bounds are omitted. Mileage and power each travel
/// as a single bound where the maximum takes precedence.
pub fn build_search_url(input: &ScraperInput) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair(params::IS_SEARCH_REQUEST, "true")
        .append_pair(params::CATEGORY, &input.search_category)
        .append_pair(params::VEHICLE_CLASS, &input.search_category)
        .append_pair(params::DAMAGED, "false");

    if !input.models.is_empty() {
        query.append_pair(params::MODELS, &input.models.join(","));
    }

    let bounds = [
        (params::PRICE_MIN, positive(input.price_min)),
        (params::PRICE_MAX, positive(input.price_max)),
        (
            params::MILEAGE,
            positive(input.mileage_km_max).or(positive(input.mileage_km_min)),
        ),
        (
            params::POWER,
            positive(input.power_kw_max).or(positive(input.power_kw_min)),
        ),
        (params::REGISTRATION_MIN, positive(input.registration_date_year_min)),
        (params::REGISTRATION_MAX, positive(input.registration_date_year_max)),
    ];
    for (name, value) in bounds {
        if let Some(value) = value {
            query.append_pair(name, &value.to_string());
        }
    }

    query.append_pair(params::SORT_BY, sort_parameter(&input.sort));

    if !input.search_terms.is_empty() {
        query.append_pair(params::QUERY, &input.search_terms.join(" "));
    }

    format!("{}?{}", SEARCH_PAGE_URL, query.finish())
}
