//! STL (Seasonal-Trend decomposition using LOESS) implementation.
//!
//! STL decomposes a time series into three components:
//! - Trend: The underlying long-term pattern
//! - Seasonal: The repeating seasonal pattern
//! - Remainder: The residual after removing trend and seasonal
//!
//! This is the non-robust procedure of Cleveland et al. (1990): outliers are
//! not down-weighted, so no robustness iterations are run.

use crate::error::{DecompositionError, Result};
use crate::utils::stats::variance;

/// Default length of the seasonal smoother.
pub const DEFAULT_SEASONAL_SMOOTHNESS: usize = 7;

/// Result of STL decomposition.
#[derive(Debug, Clone)]
pub struct STLResult {
    /// Trend component.
    pub trend: Vec<f64>,
    /// Seasonal component.
    pub seasonal: Vec<f64>,
    /// Remainder component.
    pub remainder: Vec<f64>,
}

impl STLResult {
    /// Get the seasonal strength (0 to 1).
    /// Values close to 1 indicate strong seasonality.
    pub fn seasonal_strength(&self) -> f64 {
        strength(&self.seasonal, &self.remainder)
    }

    /// Get the trend strength (0 to 1).
    /// Values close to 1 indicate strong trend.
    pub fn trend_strength(&self) -> f64 {
        strength(&self.trend, &self.remainder)
    }
}

/// `max(0, 1 - Var(R) / Var(C + R))`, zero when the denominator vanishes.
pub(crate) fn strength(component: &[f64], remainder: &[f64]) -> f64 {
    let var_remainder = variance(remainder);
    let combined: Vec<f64> = component
        .iter()
        .zip(remainder.iter())
        .map(|(c, r)| c + r)
        .collect();
    let var_combined = variance(&combined);

    if !(var_combined >= 1e-10) {
        return 0.0;
    }

    (1.0 - var_remainder / var_combined).clamp(0.0, 1.0)
}

/// STL decomposition configuration and algorithm.
#[derive(Debug, Clone)]
pub struct STL {
    /// Seasonal period (observations per cycle).
    seasonal_period: usize,
    /// Seasonal LOESS smoothing parameter (ns).
    seasonal_smoothness: usize,
    /// Trend LOESS smoothing parameter (nt); derived from ns and the period if unset.
    trend_smoothness: Option<usize>,
    /// Number of inner iterations.
    inner_iterations: usize,
}

impl STL {
    /// Create a new STL decomposer with the given seasonal period.
    pub fn new(seasonal_period: usize) -> Self {
        Self {
            seasonal_period,
            seasonal_smoothness: DEFAULT_SEASONAL_SMOOTHNESS,
            trend_smoothness: None,
            inner_iterations: 2,
        }
    }

    /// Set custom seasonal smoothness (ns parameter).
    pub fn with_seasonal_smoothness(mut self, ns: usize) -> Self {
        self.seasonal_smoothness = next_odd(ns);
        self
    }

    /// Set custom trend smoothness (nt parameter).
    pub fn with_trend_smoothness(mut self, nt: usize) -> Self {
        self.trend_smoothness = Some(next_odd(nt));
        self
    }

    /// Set number of inner iterations.
    pub fn with_inner_iterations(mut self, n: usize) -> Self {
        self.inner_iterations = n.max(1);
        self
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    pub fn seasonal_smoothness(&self) -> usize {
        self.seasonal_smoothness
    }

    /// Trend window: the smallest odd integer >= 1.5 * period / (1 - 1.5 / ns).
    pub fn trend_smoothness(&self) -> usize {
        self.trend_smoothness.unwrap_or_else(|| {
            let np = self.seasonal_period as f64;
            let ns = self.seasonal_smoothness as f64;
            next_odd((1.5 * np / (1.0 - 1.5 / ns)).ceil() as usize)
        })
    }

    /// Low-pass window (nl): the smallest odd integer greater than the period.
    pub fn low_pass_smoothness(&self) -> usize {
        next_odd(self.seasonal_period + 1)
    }

    /// Decompose the time series.
    ///
    /// # Errors
    /// * `InvalidParameter` if the period is below 2
    /// * `InsufficientData` if the series is shorter than two full periods
    /// * `MissingValues` if the series contains NaN or infinite values
    pub fn decompose(&self, series: &[f64]) -> Result<STLResult> {
        let n = series.len();
        let period = self.seasonal_period;
        if period < 2 {
            return Err(DecompositionError::InvalidParameter(format!(
                "seasonal period must be at least 2, got {period}"
            )));
        }
        if n < 2 * period {
            return Err(DecompositionError::InsufficientData {
                needed: 2 * period,
                got: n,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(DecompositionError::MissingValues);
        }

        let trend_span = self.trend_smoothness();
        let mut seasonal = vec![0.0; n];
        let mut trend = vec![0.0; n];

        for _ in 0..self.inner_iterations {
            // Step 1: Detrending
            let detrended: Vec<f64> = series.iter().zip(trend.iter()).map(|(y, t)| y - t).collect();

            // Step 2: Cycle-subseries smoothing, extended one cycle on each side
            let cycle_subseries = self.smooth_cycle_subseries(&detrended);

            // Step 3: Low-pass filter of smoothed cycle-subseries
            let low_pass = self.low_pass_filter(&cycle_subseries);

            // Step 4: Detrending of smoothed cycle-subseries
            for i in 0..n {
                seasonal[i] = cycle_subseries[period + i] - low_pass[i];
            }

            // Step 5: Deseasonalizing
            let deseasonalized: Vec<f64> = series
                .iter()
                .zip(seasonal.iter())
                .map(|(y, s)| y - s)
                .collect();

            // Step 6: Trend smoothing
            trend = loess_smooth(&deseasonalized, trend_span);
        }

        let remainder: Vec<f64> = series
            .iter()
            .zip(seasonal.iter())
            .zip(trend.iter())
            .map(|((y, s), t)| y - s - t)
            .collect();

        Ok(STLResult {
            trend,
            seasonal,
            remainder,
        })
    }

    /// Smooth each cycle-subseries and extrapolate one point at both ends.
    ///
    /// The output has length `n + 2 * period`; index `period + i` corresponds to
    /// observation `i`.
    fn smooth_cycle_subseries(&self, detrended: &[f64]) -> Vec<f64> {
        let n = detrended.len();
        let period = self.seasonal_period;
        let mut result = vec![0.0; n + 2 * period];

        for cycle_pos in 0..period {
            let subseries: Vec<f64> = detrended[cycle_pos..].iter().step_by(period).copied().collect();
            let k = subseries.len();
            if k == 0 {
                continue;
            }

            for m in 0..k + 2 {
                let xs = m as f64 - 1.0;
                let fallback = subseries[m.saturating_sub(1).min(k - 1)];
                result[m * period + cycle_pos] =
                    loess_estimate(&subseries, self.seasonal_smoothness, xs).unwrap_or(fallback);
            }
        }

        result
    }

    /// Low-pass filter: MA(period), MA(period), MA(3), then LOESS(nl).
    fn low_pass_filter(&self, extended: &[f64]) -> Vec<f64> {
        let period = self.seasonal_period;
        let ma1 = moving_average(extended, period);
        let ma2 = moving_average(&ma1, period);
        let ma3 = moving_average(&ma2, 3);
        loess_smooth(&ma3, self.low_pass_smoothness())
    }
}

impl Default for STL {
    fn default() -> Self {
        Self::new(12) // Monthly seasonality default
    }
}

fn next_odd(n: usize) -> usize {
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}

/// Trailing moving average; output has `len - window + 1` values.
fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || series.len() < window {
        return Vec::new();
    }
    let w = window as f64;
    let mut sum: f64 = series[..window].iter().sum();
    let mut result = Vec::with_capacity(series.len() - window + 1);
    result.push(sum / w);
    for i in window..series.len() {
        sum += series[i] - series[i - window];
        result.push(sum / w);
    }
    result
}

/// LOESS fit at every position of `values`.
fn loess_smooth(values: &[f64], span: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| loess_estimate(values, span, i as f64).unwrap_or(values[i]))
        .collect()
}

/// Local-linear tricube-weighted regression of `values` (at positions
/// `0..n`) evaluated at `xs`, using the `span` nearest points.
///
/// Returns `None` when every neighbourhood weight vanishes.
fn loess_estimate(values: &[f64], span: usize, xs: f64) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(values[0]);
    }

    let (left, right) = if span >= n {
        (0, n - 1)
    } else {
        let max_left = (n - span) as isize;
        let left = (xs.round() as isize - (span / 2) as isize).clamp(0, max_left) as usize;
        (left, left + span - 1)
    };

    let mut h = (xs - left as f64).max(right as f64 - xs);
    if span > n {
        h += ((span - n) / 2) as f64;
    }

    let h_inner = 0.001 * h;
    let h_outer = 0.999 * h;
    let mut weights = vec![0.0; right - left + 1];
    let mut total = 0.0;

    for (w, j) in weights.iter_mut().zip(left..=right) {
        let r = (j as f64 - xs).abs();
        if r <= h_outer {
            *w = if r <= h_inner {
                1.0
            } else {
                (1.0 - (r / h).powi(3)).powi(3)
            };
            total += *w;
        }
    }

    if total <= 0.0 {
        return None;
    }
    for w in weights.iter_mut() {
        *w /= total;
    }

    // Local-linear correction
    if h > 0.0 {
        let center: f64 = weights
            .iter()
            .zip(left..=right)
            .map(|(w, j)| w * j as f64)
            .sum();
        let spread: f64 = weights
            .iter()
            .zip(left..=right)
            .map(|(w, j)| w * (j as f64 - center).powi(2))
            .sum();
        if spread.sqrt() > 0.001 * (n - 1) as f64 {
            let slope = (xs - center) / spread;
            for (w, j) in weights.iter_mut().zip(left..=right) {
                *w *= slope * (j as f64 - center) + 1.0;
            }
        }
    }

    Some(
        weights
            .iter()
            .zip(&values[left..=right])
            .map(|(w, y)| w * y)
            .sum(),
    )
}
