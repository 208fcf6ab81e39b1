//! Parsing error types for listing extraction
//!
//! Field-level absence is never an error (it is an `Option`); these variants
//! describe structural failures that make a whole page unusable, plus the
//! transport failures reported by the fetcher.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("Required field '{field}' not found")]
    RequiredFieldMissing {
        field: String,
        context: Option<String>,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed {
        url: String,
        reason: String,
        base_url: Option<String>,
    },

    #[error("Extraction aborted unexpectedly: {message}")]
    ExtractionPanicked { message: String },

    #[error("HTTP request failed: {status} - {message}")]
    HttpRequestFailed {
        status: u16,
        message: String,
        url: String,
    },
}

impl ParsingError {
    /// Create a required field missing error with context
    pub fn required_field_missing(field: &str, context: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.map(ToString::to_string),
        }
    }

    pub fn invalid_selector(selector: &str, reason: &str) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Build an error from a caught panic payload
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::ExtractionPanicked { message }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_described() {
        let err = ParsingError::from_panic(&"boom");
        assert_eq!(
            err,
            ParsingError::ExtractionPanicked {
                message: "boom".into()
            }
        );

        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        let err = ParsingError::from_panic(owned.as_ref());
        assert!(err.to_string().contains("owned boom"));
    }

    #[test]
    fn invalid_selectors_surface_as_parsing_errors() {
        let err = crate::infrastructure::parsing::extractors::compile_group("a[")
            .unwrap_err()
            .downcast::<ParsingError>()
            .unwrap();
        assert!(matches!(err, ParsingError::InvalidSelector { ref selector, .. } if selector == "a["));
    }
}
