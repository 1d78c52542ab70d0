//! Regular period-indexed series built from aggregated admissions.

use crate::core::period::{Granularity, Period};
use crate::error::{DecompositionError, Result};
use serde::Serialize;

/// An ordered sequence of `(period, value)` pairs with unique, ascending periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegularTimeSeries {
    periods: Vec<Period>,
    values: Vec<f64>,
}

impl RegularTimeSeries {
    /// Create a new series, validating ordering, granularity and lengths.
    pub fn new(periods: Vec<Period>, values: Vec<f64>) -> Result<Self> {
        if periods.len() != values.len() {
            return Err(DecompositionError::DimensionMismatch {
                expected: periods.len(),
                got: values.len(),
            });
        }

        for i in 1..periods.len() {
            if periods[i] <= periods[i - 1] {
                return Err(DecompositionError::TimestampError(
                    "periods must be strictly increasing".to_string(),
                ));
            }
            if periods[i].granularity() != periods[0].granularity() {
                return Err(DecompositionError::TimestampError(
                    "periods must share one granularity".to_string(),
                ));
            }
        }

        Ok(Self { periods, values })
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Granularity of the index, `None` for an empty series.
    pub fn granularity(&self) -> Option<Granularity> {
        self.periods.first().map(Period::granularity)
    }

    /// Value recorded for `period`, if present.
    pub fn get(&self, period: &Period) -> Option<f64> {
        self.periods
            .binary_search(period)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Iterate over `(period, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Period, f64)> + '_ {
        self.periods.iter().zip(self.values.iter().copied())
    }

    /// Same index with replacement values.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.len() {
            return Err(DecompositionError::DimensionMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        Ok(Self {
            periods: self.periods.clone(),
            values,
        })
    }

    /// Number of NaN or infinite values.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_finite()).count()
    }

    /// Periods absent between the first and last observation.
    ///
    /// Aggregation never synthesizes these; callers may want to report them.
    pub fn gaps(&self) -> Vec<Period> {
        let mut gaps = Vec::new();
        for pair in self.periods.windows(2) {
            let mut next = pair[0].succ();
            while let Some(p) = next {
                if p >= pair[1] {
                    break;
                }
                gaps.push(p);
                next = p.succ();
            }
        }
        gaps
    }
}

/// Carry the last finite value forward over NaN/Inf entries.
///
/// Leading missing values stay missing.
pub fn forward_fill(values: &[f64]) -> Vec<f64> {
    let mut result = Vec::with_capacity(values.len());
    let mut last_valid = None;
    for &v in values {
        if v.is_finite() {
            last_valid = Some(v);
            result.push(v);
        } else {
            result.push(last_valid.unwrap_or(v));
        }
    }
    result
}

/// Carry the next finite value backward over NaN/Inf entries.
///
/// Trailing missing values stay missing.
pub fn backward_fill(values: &[f64]) -> Vec<f64> {
    let mut result = values.to_vec();
    let mut next_valid = None;
    for v in result.iter_mut().rev() {
        if v.is_finite() {
            next_valid = Some(*v);
        } else if let Some(next) = next_valid {
            *v = next;
        }
    }
    result
}
