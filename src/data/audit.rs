//! Missing-value audit of a dataset.
//!
//! Only null cells and NaN numbers count as missing. A zero count is a valid
//! observation here; the orchestrator's zero-as-missing heuristic is confined
//! to its retry path.

use crate::data::dataset::Dataset;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-column counts of missing entries. Columns without missing entries are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissingValueReport {
    counts: BTreeMap<String, usize>,
}

impl MissingValueReport {
    /// True when no column has missing entries.
    pub fn is_clean(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    /// Missing entries in `column` (zero for clean or unknown columns).
    pub fn missing_in(&self, column: &str) -> usize {
        self.counts.get(column).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Count missing entries in every column of `dataset`.
pub fn audit_missing(dataset: &Dataset) -> MissingValueReport {
    let counts = dataset
        .columns()
        .filter_map(|(name, cells)| {
            let missing = cells.iter().filter(|c| c.is_missing()).count();
            (missing > 0).then(|| (name.to_string(), missing))
        })
        .collect();
    MissingValueReport { counts }
}
