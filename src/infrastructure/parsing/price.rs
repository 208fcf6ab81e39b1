//! Locale-aware price normalization
//!
//! German listings group thousands with `.` and use `,` as decimal mark, but
//! both conventions appear on the site. The separator is guessed from the
//! shape of the digit run:
//!
//! * `.` and `,` present: `.` groups thousands, `,` is the decimal mark
//! * only `,`: decimal mark; several `,` leave the run unparseable
//! * several `.`: thousands grouping
//! * otherwise the run is parsed as written
//!
//! A lone `.` is therefore read as a decimal mark ("12.500" is 12.5). That is
//! an accepted approximation.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\d.,]+").expect("number run pattern compiles"));

/// Parse a displayed price into an amount; never panics
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '£') && !c.is_whitespace())
        .collect();

    let run = NUMBER_RUN.find(&cleaned)?.as_str();
    if !run.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let has_comma = run.contains(',');
    let dots = run.matches('.').count();

    let normalized = if has_comma && dots > 0 {
        run.replace('.', "").replace(',', ".")
    } else if has_comma {
        run.replace(',', ".")
    } else if dots > 1 {
        run.replace('.', "")
    } else {
        run.to_string()
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
}
