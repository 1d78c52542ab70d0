//! Tabular input, observation records, temporal aggregation and auditing.

pub mod aggregate;
pub mod audit;
pub mod dataset;
pub mod record;

pub use aggregate::{TemporalAggregator, DEFAULT_DATE_FORMAT};
pub use audit::{audit_missing, MissingValueReport};
pub use dataset::{Cell, Dataset};
pub use record::{extract_records, DateColumns, ObservationRecord, RecordDate, RecordSchema};
