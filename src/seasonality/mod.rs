//! Seasonal decomposition.
//!
//! This module provides tools for analyzing seasonal patterns in time series:
//! - STL: Seasonal-Trend decomposition using LOESS
//! - Seasonal subseries: the seasonal effect pivoted by cycle position and year

mod stl;
mod subseries;

pub use stl::{STLResult, DEFAULT_SEASONAL_SMOOTHNESS, STL};
pub use subseries::{seasonal_subseries, SeasonalSubseries};

pub(crate) use stl::strength;
