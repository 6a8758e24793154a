//! Utility functions for common operations.
//!
//! - **Text shaping**: markup stripping, excerpts, and Unicode-aware
//!   truncation for terminal listings
//! - **URL validation**: checks applied to configured feed locations

mod text;
mod url_validator;

pub use text::{display_width, excerpt, sanitize_for_terminal, strip_html, truncate_to_width};
pub use url_validator::{validate_feed_url, UrlValidationError};
