//! Box-Cox power transformation.
//!
//! Stabilizes the variance of strictly positive count series. The transform
//! parameter is estimated by maximum likelihood, with a profile-likelihood
//! confidence interval used to decide whether the identity transform (λ = 1)
//! is statistically indistinguishable from the optimum.

use crate::core::RegularTimeSeries;
use crate::error::{DecompositionError, Result};
use crate::utils::optimization::{bisect, golden_section_max, ScalarSearchConfig};
use crate::utils::stats::{is_constant, population_variance};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::debug;

/// Default confidence level for the λ interval.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

const LAMBDA_GRID_BOUND: f64 = 5.0;
const LAMBDA_GRID_STEP: f64 = 0.05;
const CI_STEP: f64 = 0.1;
const CI_SEARCH_LIMIT: f64 = 20.0;

/// Result of fitting a Box-Cox transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxCoxFit {
    /// Transformed data
    pub data: Vec<f64>,
    /// Maximum likelihood estimate of λ
    pub lambda: f64,
    /// Lower bound of the confidence interval for λ
    pub ci_lower: f64,
    /// Upper bound of the confidence interval for λ
    pub ci_upper: f64,
    /// Confidence level of the interval
    pub confidence_level: f64,
    /// Profile log-likelihood at `lambda`
    pub log_likelihood: f64,
}

impl BoxCoxFit {
    /// Inverse transform to recover original scale.
    pub fn inverse(&self) -> Vec<f64> {
        inv_boxcox(&self.data, self.lambda)
    }

    /// Whether `value` lies inside the confidence interval (bounds inclusive).
    pub fn ci_contains(&self, value: f64) -> bool {
        self.ci_lower <= value && value <= self.ci_upper
    }
}

/// Apply Box-Cox transformation with a given lambda.
///
/// For lambda != 0: y = (x^lambda - 1) / lambda
/// For lambda == 0: y = ln(x)
///
/// Returns NaN for non-positive values.
pub fn boxcox(series: &[f64], lambda: f64) -> Vec<f64> {
    series
        .iter()
        .map(|&x| {
            if x <= 0.0 {
                f64::NAN
            } else if lambda.abs() < 1e-10 {
                x.ln()
            } else {
                (x.powf(lambda) - 1.0) / lambda
            }
        })
        .collect()
}

/// Inverse Box-Cox transformation.
///
/// For lambda != 0: x = (lambda * y + 1)^(1/lambda)
/// For lambda == 0: x = exp(y)
///
/// Values outside the image of the forward transform map to NaN.
pub fn inv_boxcox(transformed: &[f64], lambda: f64) -> Vec<f64> {
    transformed
        .iter()
        .map(|&y| {
            if lambda.abs() < 1e-10 {
                y.exp()
            } else {
                let val = lambda * y + 1.0;
                if val <= 0.0 {
                    f64::NAN
                } else {
                    val.powf(1.0 / lambda)
                }
            }
        })
        .collect()
}

/// Profile log-likelihood of λ for positive data.
///
/// `llf = (λ - 1) Σ ln x - n/2 ln σ²`, with σ² the population variance of the
/// transformed values. Returns negative infinity where it is undefined.
pub fn boxcox_llf(series: &[f64], lambda: f64) -> f64 {
    let n = series.len();
    if n < 2 {
        return f64::NEG_INFINITY;
    }

    let transformed = boxcox(series, lambda);
    if transformed.iter().any(|x| !x.is_finite()) {
        return f64::NEG_INFINITY;
    }

    let variance = population_variance(&transformed);
    if !variance.is_finite() || variance <= 0.0 {
        return f64::NEG_INFINITY;
    }

    let log_sum: f64 = series.iter().map(|x| x.ln()).sum();
    (lambda - 1.0) * log_sum - 0.5 * n as f64 * variance.ln()
}

/// Find optimal Box-Cox lambda using maximum likelihood estimation.
///
/// Coarse grid over [-5, 5] followed by golden-section refinement around the
/// best grid point. Non-positive values are ignored; returns 1.0 when fewer
/// than two positive values remain.
pub fn boxcox_lambda(series: &[f64]) -> f64 {
    let positive: Vec<f64> = series.iter().copied().filter(|&x| x > 0.0).collect();
    if positive.len() < 2 {
        return 1.0;
    }

    let steps = (LAMBDA_GRID_BOUND / LAMBDA_GRID_STEP).round() as i32;
    let mut best_lambda = 1.0;
    let mut best_llf = f64::NEG_INFINITY;

    for i in -steps..=steps {
        let lambda = i as f64 * LAMBDA_GRID_STEP;
        let llf = boxcox_llf(&positive, lambda);
        if llf > best_llf {
            best_llf = llf;
            best_lambda = lambda;
        }
    }

    let refined = golden_section_max(
        |l| boxcox_llf(&positive, l),
        best_lambda - LAMBDA_GRID_STEP,
        best_lambda + LAMBDA_GRID_STEP,
        ScalarSearchConfig::default(),
    );

    if refined.value >= best_llf {
        refined.point
    } else {
        best_lambda
    }
}

/// Fit λ and its confidence interval.
///
/// The interval holds every λ whose log-likelihood is within
/// `½ χ²₁(confidence_level)` of the maximum. When the likelihood does not
/// drop below that threshold within 20 units of the estimate, the search
/// limit is reported as the bound.
///
/// # Errors
/// * `Configuration` if `confidence_level` is not in (0, 1)
/// * `InsufficientData` for fewer than two values
/// * `MissingValues` for NaN or infinite values
/// * `Domain` for the first value that is zero or negative
/// * `Degenerate` for a constant series
pub fn boxcox_fit(series: &[f64], confidence_level: f64) -> Result<BoxCoxFit> {
    validate_confidence_level(confidence_level)?;

    if series.len() < 2 {
        return Err(DecompositionError::InsufficientData {
            needed: 2,
            got: series.len(),
        });
    }
    if series.iter().any(|x| !x.is_finite()) {
        return Err(DecompositionError::MissingValues);
    }
    if let Some((index, &value)) = series.iter().enumerate().find(|(_, &x)| x <= 0.0) {
        return Err(DecompositionError::Domain { index, value });
    }
    if is_constant(series, 1e-12) {
        return Err(DecompositionError::Degenerate(
            "constant series has no variance to stabilize".to_string(),
        ));
    }

    let lambda = boxcox_lambda(series);
    let log_likelihood = boxcox_llf(series, lambda);
    if !log_likelihood.is_finite() {
        return Err(DecompositionError::ComputationError(format!(
            "Box-Cox log-likelihood is not finite at lambda = {lambda}"
        )));
    }

    let chi2 = ChiSquared::new(1.0)
        .map_err(|e| DecompositionError::ComputationError(e.to_string()))?
        .inverse_cdf(confidence_level);
    let threshold = log_likelihood - 0.5 * chi2;
    let excess = |l: f64| boxcox_llf(series, l) - threshold;

    let ci_lower = profile_bound(&excess, lambda, -1.0);
    let ci_upper = profile_bound(&excess, lambda, 1.0);

    debug!(lambda, ci_lower, ci_upper, confidence_level, "fitted Box-Cox transform");

    Ok(BoxCoxFit {
        data: boxcox(series, lambda),
        lambda,
        ci_lower,
        ci_upper,
        confidence_level,
        log_likelihood,
    })
}

/// Walk away from `lambda` in `direction` until `excess` turns negative, then
/// bisect the crossing.
fn profile_bound<F>(excess: &F, lambda: f64, direction: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let steps = (CI_SEARCH_LIMIT / CI_STEP).round() as usize;
    let mut inner = lambda;
    for k in 1..=steps {
        let outer = lambda + direction * CI_STEP * k as f64;
        if excess(outer) < 0.0 {
            return bisect(excess, inner, outer, ScalarSearchConfig::default())
                .map(|r| r.point)
                .unwrap_or(inner);
        }
        inner = outer;
    }
    lambda + direction * CI_SEARCH_LIMIT
}

fn validate_confidence_level(level: f64) -> Result<()> {
    if level.is_finite() && level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(DecompositionError::Configuration(format!(
            "confidence level must be in (0, 1), got {level}"
        )))
    }
}

/// Box-Cox fitting and transformation of regular series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceStabilizer {
    confidence_level: f64,
}

impl VarianceStabilizer {
    pub fn new(confidence_level: f64) -> Result<Self> {
        validate_confidence_level(confidence_level)?;
        Ok(Self { confidence_level })
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Estimate λ and its confidence interval for the series values.
    pub fn fit(&self, series: &RegularTimeSeries) -> Result<BoxCoxFit> {
        boxcox_fit(series.values(), self.confidence_level)
    }

    /// Forward transform, failing on the first non-positive value.
    pub fn transform(&self, series: &RegularTimeSeries, lambda: f64) -> Result<RegularTimeSeries> {
        if let Some((index, value)) = series
            .values()
            .iter()
            .copied()
            .enumerate()
            .find(|(_, x)| !(*x > 0.0))
        {
            return Err(DecompositionError::Domain { index, value });
        }
        series.with_values(boxcox(series.values(), lambda))
    }

    /// Inverse transform back to the original scale.
    ///
    /// Values outside the image of the forward transform become NaN.
    pub fn inverse(&self, series: &RegularTimeSeries, lambda: f64) -> Result<RegularTimeSeries> {
        series.with_values(inv_boxcox(series.values(), lambda))
    }
}

impl Default for VarianceStabilizer {
    fn default() -> Self {
        Self {
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
        }
    }
}
