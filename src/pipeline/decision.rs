//! Choice between decomposing on the raw or the Box-Cox scale.

use serde::Serialize;
use std::fmt;

/// Scale on which the series is decomposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleDecision {
    /// λ = 1 is plausible: decompose the observed values.
    Raw,
    /// λ = 1 is rejected: decompose the transformed values and back-transform.
    Transformed,
}

impl ScaleDecision {
    /// Raw when the closed interval `[lower, upper]` contains 1.0, transformed otherwise.
    ///
    /// `lambda` only identifies the estimate the interval belongs to.
    pub fn from_interval(lambda: f64, lower: f64, upper: f64) -> Self {
        debug_assert!(lower <= upper || lower.is_nan() || upper.is_nan(), "interval for λ = {lambda} is inverted");
        if lower <= 1.0 && 1.0 <= upper {
            ScaleDecision::Raw
        } else {
            ScaleDecision::Transformed
        }
    }

    pub fn is_transformed(&self) -> bool {
        matches!(self, ScaleDecision::Transformed)
    }
}

impl fmt::Display for ScaleDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleDecision::Raw => write!(f, "raw"),
            ScaleDecision::Transformed => write!(f, "transformed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_containing_one_keeps_raw_scale() {
        assert_eq!(ScaleDecision::from_interval(0.9, 0.6, 1.2), ScaleDecision::Raw);
    }

    #[test]
    fn interval_excluding_one_transforms() {
        assert_eq!(
            ScaleDecision::from_interval(0.2, 0.05, 0.4),
            ScaleDecision::Transformed
        );
        assert_eq!(
            ScaleDecision::from_interval(1.6, 1.1, 2.2),
            ScaleDecision::Transformed
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(ScaleDecision::from_interval(0.7, 0.4, 1.0), ScaleDecision::Raw);
        assert_eq!(ScaleDecision::from_interval(1.3, 1.0, 1.6), ScaleDecision::Raw);
    }

    #[test]
    fn nan_bounds_transform() {
        assert!(ScaleDecision::from_interval(f64::NAN, f64::NAN, f64::NAN).is_transformed());
    }
}
