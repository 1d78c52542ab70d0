//! Numeric helpers shared by the transform and decomposition code.

pub mod optimization;
pub mod stats;

pub use optimization::{bisect, golden_section_max, ScalarSearchConfig, ScalarSearchResult};
