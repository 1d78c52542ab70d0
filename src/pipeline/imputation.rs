//! Zero-as-missing imputation applied before a group's single retry.

use crate::core::{backward_fill, forward_fill, RegularTimeSeries};
use crate::error::Result;

/// Number of exact zeros in the series.
pub fn zero_count(series: &RegularTimeSeries) -> usize {
    series.values().iter().filter(|&&v| v == 0.0).count()
}

/// Treat zeros as missing, fill forward from the last valid value, then
/// backward for any leading gap.
///
/// Returns a new series; the input is left untouched. A series without zeros
/// or other missing values comes back unchanged. Only zeros and non-finite
/// values are replaced.
pub fn impute_zeros(series: &RegularTimeSeries) -> Result<RegularTimeSeries> {
    let masked: Vec<f64> = series
        .values()
        .iter()
        .map(|&v| if v == 0.0 { f64::NAN } else { v })
        .collect();
    let filled = backward_fill(&forward_fill(&masked));
    series.with_values(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;

    fn monthly(values: &[f64]) -> RegularTimeSeries {
        let mut periods = Vec::with_capacity(values.len());
        let mut p = Period::from_year_month(2018, 1).unwrap();
        for _ in 0..values.len() {
            periods.push(p);
            p = p.succ().unwrap();
        }
        RegularTimeSeries::new(periods, values.to_vec()).unwrap()
    }

    #[test]
    fn interior_zeros_take_previous_value() {
        let series = monthly(&[4.0, 0.0, 0.0, 7.0, 0.0, 2.0]);
        let imputed = impute_zeros(&series).unwrap();
        assert_eq!(imputed.values(), &[4.0, 4.0, 4.0, 7.0, 7.0, 2.0]);
        assert_eq!(imputed.periods(), series.periods());
    }

    #[test]
    fn leading_zeros_take_next_value() {
        let series = monthly(&[0.0, 0.0, 3.0, 5.0]);
        let imputed = impute_zeros(&series).unwrap();
        assert_eq!(imputed.values(), &[3.0, 3.0, 3.0, 5.0]);
    }

    #[test]
    fn input_is_not_modified() {
        let series = monthly(&[1.0, 0.0, 2.0]);
        let _ = impute_zeros(&series).unwrap();
        assert_eq!(series.values(), &[1.0, 0.0, 2.0]);
        assert_eq!(zero_count(&series), 1);
    }

    #[test]
    fn no_zeros_is_a_no_op() {
        let series = monthly(&[1.0, 2.0, 3.0]);
        assert_eq!(impute_zeros(&series).unwrap(), series);
    }

    #[test]
    fn idempotent() {
        let series = monthly(&[0.0, 2.0, 0.0, 0.0, 9.0, 0.0]);
        let once = impute_zeros(&series).unwrap();
        let twice = impute_zeros(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn all_zero_series_stays_missing() {
        let series = monthly(&[0.0, 0.0, 0.0]);
        let imputed = impute_zeros(&series).unwrap();
        assert!(imputed.values().iter().all(|v| v.is_nan()));
    }
}
