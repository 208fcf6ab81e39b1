//! Dealer block and review extraction
//!
//! A missing dealer name means the page has no seller block at all and the
//! whole sub-record is absent. Every other field is independently optional and
//! collections that came up empty are reported as absent, not as `[]`.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use scraper::{ElementRef, Selector};
use tracing::debug;

use super::config::{DealerSelectors, ParsingConfig};
use super::extractors::{
    compile_group, dedup_ordered, element_text, first_float, first_integer, leading_float,
    scoped_text, SelectorChain,
};
use crate::domain::vehicle::{DealerDetail, DealerScore, Review, ReviewDetails};

const TEL_SCHEME: &str = "tel:";
const MAILTO_SCHEME: &str = "mailto:";

/// Parser for the seller section of a detail page
#[derive(Debug, Clone)]
pub struct DealerDetailParser {
    name: SelectorChain,
    seller_type: SelectorChain,
    phone: Selector,
    address: SelectorChain,
    email_link: SelectorChain,
    website: SelectorChain,
    rating: SelectorChain,
    review_count: SelectorChain,
    review: ReviewParser,
}

#[derive(Debug, Clone)]
struct ReviewParser {
    item: Selector,
    reviewer_name: Selector,
    score: Selector,
    date: Selector,
    positive: Selector,
    negative: Selector,
}

impl DealerDetailParser {
    /// Create a dealer parser with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&ParsingConfig::default().dealer)
    }

    pub fn with_config(selectors: &DealerSelectors) -> Result<Self> {
        let review = &selectors.review;
        Ok(Self {
            name: SelectorChain::compile("dealer_name", &selectors.name)?,
            seller_type: SelectorChain::compile("seller_type", &selectors.seller_type)?,
            phone: compile_group(&selectors.phone)?,
            address: SelectorChain::compile("dealer_address", &selectors.address)?,
            email_link: SelectorChain::compile("dealer_email", &selectors.email_link)?,
            website: SelectorChain::compile("dealer_website", &selectors.website)?,
            rating: SelectorChain::compile("dealer_rating", &selectors.rating)?,
            review_count: SelectorChain::compile("review_count", &selectors.review_count)?,
            review: ReviewParser {
                item: compile_group(&review.item)?,
                reviewer_name: compile_group(&review.reviewer_name)?,
                score: compile_group(&review.score)?,
                date: compile_group(&review.date)?,
                positive: compile_group(&review.positive)?,
                negative: compile_group(&review.negative)?,
            },
        })
    }

    /// Extract the dealer sub-record, examining at most `review_limit` reviews
    pub fn extract(&self, scope: ElementRef<'_>, review_limit: usize) -> Option<DealerDetail> {
        let Some(name) = self.name.first_text(scope) else {
            debug!("No dealer name found, skipping dealer details");
            return None;
        };

        let mut dealer = DealerDetail::new(name);
        if let Some(seller_type) = self.seller_type.first_text(scope) {
            dealer.seller_type = seller_type;
        }
        dealer.phones = self.extract_phones(scope);
        dealer.address = self.address.first_text(scope);
        dealer.email = self.extract_email(scope);
        dealer.homepage_url = self
            .website
            .first_attr(scope, "href")
            .or_else(|| self.website.first_text(scope));
        dealer.score = self
            .rating
            .first_text(scope)
            .and_then(|text| first_float(&text))
            .map(|total| DealerScore { total });
        dealer.active_rating_count = self
            .review_count
            .first_text(scope)
            .and_then(|text| first_integer(&text));
        dealer.reviews = self.extract_reviews(scope, review_limit);

        debug!(
            "Extracted dealer '{}' with {} reviews",
            dealer.name,
            dealer.reviews.as_ref().map_or(0, Vec::len)
        );
        Some(dealer)
    }

    /// A `tel:` target wins over the visible label
    fn extract_phones(&self, scope: ElementRef<'_>) -> Option<Vec<String>> {
        let phones = dedup_ordered(scope.select(&self.phone).filter_map(|element| {
            element
                .value()
                .attr("href")
                .and_then(|href| href.trim().strip_prefix(TEL_SCHEME))
                .map(|number| number.trim().to_string())
                .filter(|number| !number.is_empty())
                .or_else(|| Some(element_text(element)).filter(|text| !text.is_empty()))
        }));

        (!phones.is_empty()).then_some(phones)
    }

    fn extract_email(&self, scope: ElementRef<'_>) -> Option<String> {
        let href = self.email_link.first_attr(scope, "href")?;
        let address = href.strip_prefix(MAILTO_SCHEME)?;
        let address = address.split('?').next().unwrap_or(address).trim();
        (!address.is_empty()).then(|| address.to_string())
    }

    /// Only the first `review_limit` candidates are examined; candidates
    /// without a reviewer name and without a score are then dropped.
    fn extract_reviews(&self, scope: ElementRef<'_>, review_limit: usize) -> Option<Vec<Review>> {
        if review_limit == 0 {
            return None;
        }

        let reviews: Vec<Review> = scope
            .select(&self.review.item)
            .take(review_limit)
            .map(|item| self.review.parse(item))
            .filter(Review::is_meaningful)
            .collect();

        (!reviews.is_empty()).then_some(reviews)
    }
}

impl ReviewParser {
    fn parse(&self, item: ElementRef<'_>) -> Review {
        Review {
            reviewer_name: scoped_text(item, &self.reviewer_name),
            total_score: scoped_text(item, &self.score).and_then(|text| leading_float(&text)),
            review_date: scoped_text(item, &self.date),
            details: ReviewDetails {
                liked_text: scoped_text(item, &self.positive),
                disliked_text: scoped_text(item, &self.negative),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn extract(markup: &str, review_limit: usize) -> Option<DealerDetail> {
        let html = Html::parse_document(markup);
        DealerDetailParser::new()
            .unwrap()
            .extract(html.root_element(), review_limit)
    }

    fn review(name: &str, score: &str) -> String {
        format!(
            r#"<div class="review-item"><span class="reviewer-name">{}</span><span class="review-score">{}</span></div>"#,
            name, score
        )
    }

    #[test]
    fn missing_name_means_no_dealer() {
        let dealer = extract(
            r#"<div class="dealer-phone">+49 30 1234</div><div class="dealer-address">Berlin</div>"#,
            5,
        );
        assert!(dealer.is_none());
    }

    #[test]
    fn dealer_without_phone_has_absent_phones() {
        let dealer = extract(r#"<div class="dealer-name">Autohaus Nord</div>"#, 5).unwrap();
        assert_eq!(dealer.name, "Autohaus Nord");
        assert_eq!(dealer.seller_type, "Unknown");
        assert_eq!(dealer.phones, None);
        assert_eq!(dealer.reviews, None);
    }

    #[test]
    fn phones_come_from_text_and_tel_links_deduplicated() {
        let dealer = extract(
            r#"<div class="dealer-name">Autohaus Nord</div>
               <span class="dealer-phone">+49 30 1234</span>
               <a href="tel:+49 30 1234"></a>
               <a href="tel:+49 40 9876"></a>"#,
            5,
        )
        .unwrap();
        assert_eq!(
            dealer.phones,
            Some(vec!["+49 30 1234".to_string(), "+49 40 9876".to_string()])
        );
    }

    #[test]
    fn labelled_tel_links_record_the_number() {
        let dealer = extract(
            r#"<div class="dealer-name">A</div>
               <a href="tel:+4930123">Anrufen</a>
               <a class="dealer-phone" href="/kontakt">+49 40 555</a>"#,
            5,
        )
        .unwrap();
        assert_eq!(
            dealer.phones,
            Some(vec!["+4930123".to_string(), "+49 40 555".to_string()])
        );
    }

    #[test]
    fn contact_and_rating_fields() {
        let dealer = extract(
            r#"<div data-testid="seller-name">Autohaus Süd</div>
               <div data-testid="seller-type">Dealer</div>
               <a href="mailto:info@autohaus-sued.de?subject=Anfrage">Mail</a>
               <div class="dealer-website"><a href="https://autohaus-sued.de">Website</a></div>
               <div class="dealer-rating">4,6 von 5</div>
               <div class="review-count">(312 Bewertungen)</div>"#,
            5,
        )
        .unwrap();

        assert_eq!(dealer.seller_type, "Dealer");
        assert_eq!(dealer.email.as_deref(), Some("info@autohaus-sued.de"));
        assert_eq!(dealer.homepage_url.as_deref(), Some("https://autohaus-sued.de"));
        assert_eq!(dealer.score, Some(DealerScore { total: 4.6 }));
        assert_eq!(dealer.active_rating_count, Some(312));
    }

    #[test]
    fn review_candidates_are_bounded_before_filtering() {
        let mut markup = String::from(r#"<div class="dealer-name">Autohaus Nord</div>"#);
        markup.push_str(&review("", ""));
        for i in 0..9 {
            markup.push_str(&review(&format!("Reviewer {}", i), "4.0"));
        }

        let dealer = extract(&markup, 3).unwrap();
        let reviews = dealer.reviews.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].reviewer_name.as_deref(), Some("Reviewer 0"));
        assert_eq!(reviews[0].total_score, Some(4.0));
    }

    #[test]
    fn zero_review_limit_skips_reviews() {
        let markup = format!(
            r#"<div class="dealer-name">Autohaus Nord</div>{}"#,
            review("Anna", "5")
        );
        assert_eq!(extract(&markup, 0).unwrap().reviews, None);
    }

    #[test]
    fn review_details_are_scoped_to_their_element() {
        let markup = r#"<div class="dealer-name">Autohaus Nord</div>
            <div class="review-item">
              <span class="reviewer-name">Anna</span>
              <span class="review-date">12.02.2024</span>
              <p class="review-positive">Friendly staff</p>
            </div>
            <div class="review-item">
              <span class="review-score">3.5</span>
              <p class="review-negative">Slow paperwork</p>
            </div>"#;

        let reviews = extract(markup, 5).unwrap().reviews.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].details.liked_text.as_deref(), Some("Friendly staff"));
        assert_eq!(reviews[0].details.disliked_text, None);
        assert_eq!(reviews[0].review_date.as_deref(), Some("12.02.2024"));
        assert_eq!(reviews[1].reviewer_name, None);
        assert_eq!(reviews[1].total_score, Some(3.5));
        assert_eq!(reviews[1].details.disliked_text.as_deref(), Some("Slow paperwork"));
    }
}
