//! Text normalization applied to submissions before any comparison.

mod clean;
mod intel_hex;
mod listing;

pub use clean::clean_source;
pub use intel_hex::{HexParse, parse_intel_hex};
pub use listing::extract_code_from_listing;
