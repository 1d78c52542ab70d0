//! Seasonal subseries pivot: the seasonal effect arranged by cycle position and year.

use crate::core::{Granularity, Period};
use crate::error::{DecompositionError, Result};
use std::collections::{BTreeMap, BTreeSet};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Seasonal values pivoted to rows = position in cycle, columns = year.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalSubseries {
    granularity: Granularity,
    positions: Vec<u32>,
    years: Vec<i32>,
    cells: BTreeMap<(u32, i32), f64>,
}

impl SeasonalSubseries {
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Cycle positions present in the data, ascending.
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Years present in the data, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn value(&self, position: u32, year: i32) -> Option<f64> {
        self.cells.get(&(position, year)).copied()
    }

    /// One row of the pivot; `None` where the year has no observation.
    pub fn row(&self, position: u32) -> Vec<Option<f64>> {
        self.years
            .iter()
            .map(|&year| self.value(position, year))
            .collect()
    }

    /// Row label: month abbreviation for monthly data, `Q1`..`Q4`, `W01`.. or
    /// the day number otherwise.
    pub fn row_label(&self, position: u32) -> String {
        match self.granularity {
            Granularity::Month => MONTH_ABBREVIATIONS
                .get(position.wrapping_sub(1) as usize)
                .map(|s| s.to_string())
                .unwrap_or_else(|| position.to_string()),
            Granularity::Quarter => format!("Q{position}"),
            Granularity::Week => format!("W{position:02}"),
            Granularity::Day => position.to_string(),
        }
    }

    /// Average seasonal effect per cycle position across the observed years.
    pub fn position_means(&self) -> BTreeMap<u32, f64> {
        let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
        for (&(position, _), &value) in &self.cells {
            let entry = sums.entry(position).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(position, (sum, count))| (position, sum / count as f64))
            .collect()
    }
}

/// Pivot a seasonal component indexed by `periods`.
///
/// # Errors
/// * `DimensionMismatch` if the slices differ in length
/// * `InsufficientData` if they are empty
pub fn seasonal_subseries(periods: &[Period], seasonal: &[f64]) -> Result<SeasonalSubseries> {
    if periods.len() != seasonal.len() {
        return Err(DecompositionError::DimensionMismatch {
            expected: periods.len(),
            got: seasonal.len(),
        });
    }
    let granularity = periods
        .first()
        .map(Period::granularity)
        .ok_or(DecompositionError::InsufficientData { needed: 1, got: 0 })?;

    let mut positions = BTreeSet::new();
    let mut years = BTreeSet::new();
    let mut cells = BTreeMap::new();
    for (period, &value) in periods.iter().zip(seasonal) {
        let key = (period.cycle_position(), period.year());
        positions.insert(key.0);
        years.insert(key.1);
        cells.insert(key, value);
    }

    Ok(SeasonalSubseries {
        granularity,
        positions: positions.into_iter().collect(),
        years: years.into_iter().collect(),
        cells,
    })
}
