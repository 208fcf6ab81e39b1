//! Parsing error re-export
//!
//! The error types live in `infrastructure::parsing_error`.

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
