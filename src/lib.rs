//! # admissions-decompose
//!
//! Seasonal-trend decomposition of monthly admission counts.
//!
//! Raw records are summed into regular period-indexed series, a Box-Cox
//! confidence interval decides whether the series is decomposed on the raw or
//! the transformed scale, STL splits it into trend, seasonal and residual
//! components, and the result is reconciled back to the original scale. Runs
//! can cover one pooled series or one series per group (e.g. per province),
//! where failing groups are retried once with zeros treated as missing.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod seasonality;
pub mod transform;
pub mod utils;

pub use error::{DecompositionError, Result};

pub mod prelude {
    pub use crate::core::{Granularity, Period, RegularTimeSeries};
    pub use crate::data::{Dataset, ObservationRecord, RecordSchema, TemporalAggregator};
    pub use crate::error::{DecompositionError, Result};
    pub use crate::pipeline::{
        collate, Component, DecompositionConfig, DecompositionOrchestrator, DecompositionOutput,
        DecompositionResult, GroupedDecomposition, ScaleDecision, Scope,
    };
}
