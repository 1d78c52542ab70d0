//! Core data structures: periods and regular time series.

mod period;
mod time_series;

pub use period::{parse_date, Granularity, Period};
pub use time_series::{backward_fill, forward_fill, RegularTimeSeries};
