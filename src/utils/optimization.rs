//! One-dimensional optimization and root finding for parameter estimation.

/// Result of a one-dimensional search.
#[derive(Debug, Clone, Copy)]
pub struct ScalarSearchResult {
    /// The point found.
    pub point: f64,
    /// Objective value at `point`.
    pub value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the bracket shrank below the tolerance.
    pub converged: bool,
}

/// Configuration for scalar searches.
#[derive(Debug, Clone, Copy)]
pub struct ScalarSearchConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Absolute tolerance on the bracket width.
    pub tolerance: f64,
}

impl Default for ScalarSearchConfig {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tolerance: 1e-10,
        }
    }
}

/// Maximize a unimodal function on `[lower, upper]` by golden-section search.
///
/// # Example
/// ```
/// use admissions_decompose::utils::optimization::{golden_section_max, ScalarSearchConfig};
///
/// let result = golden_section_max(|x| -(x - 0.3).powi(2), -2.0, 2.0, ScalarSearchConfig::default());
/// assert!(result.converged);
/// assert!((result.point - 0.3).abs() < 1e-6);
/// ```
pub fn golden_section_max<F>(
    objective: F,
    lower: f64,
    upper: f64,
    config: ScalarSearchConfig,
) -> ScalarSearchResult
where
    F: Fn(f64) -> f64,
{
    let inv_phi = (5.0_f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = if lower <= upper {
        (lower, upper)
    } else {
        (upper, lower)
    };

    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = objective(c);
    let mut fd = objective(d);

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        if (b - a).abs() < config.tolerance {
            converged = true;
            break;
        }
        iterations += 1;

        if fc > fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = objective(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = objective(d);
        }
    }

    let point = (a + b) / 2.0;
    ScalarSearchResult {
        point,
        value: objective(point),
        iterations,
        converged,
    }
}

/// Find a root of `f` in `[lower, upper]` by bisection.
///
/// Returns `None` when `f(lower)` and `f(upper)` share a sign.
pub fn bisect<F>(f: F, lower: f64, upper: f64, config: ScalarSearchConfig) -> Option<ScalarSearchResult>
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (lower, upper);
    let mut fa = f(a);
    let fb = f(b);

    if fa == 0.0 {
        return Some(ScalarSearchResult {
            point: a,
            value: fa,
            iterations: 0,
            converged: true,
        });
    }
    if fb == 0.0 {
        return Some(ScalarSearchResult {
            point: b,
            value: fb,
            iterations: 0,
            converged: true,
        });
    }
    if fa.signum() == fb.signum() || fa.is_nan() || fb.is_nan() {
        return None;
    }

    let mut iterations = 0;
    let mut converged = false;
    while iterations < config.max_iter {
        iterations += 1;
        let mid = (a + b) / 2.0;
        let fm = f(mid);

        if fm == 0.0 || (b - a).abs() / 2.0 < config.tolerance {
            a = mid;
            b = mid;
            converged = true;
            break;
        }
        if fm.signum() == fa.signum() {
            a = mid;
            fa = fm;
        } else {
            b = mid;
        }
    }

    let point = (a + b) / 2.0;
    Some(ScalarSearchResult {
        point,
        value: f(point),
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn golden_section_finds_quadratic_peak() {
        let result = golden_section_max(
            |x| -(x - 1.25).powi(2) + 3.0,
            -5.0,
            5.0,
            ScalarSearchConfig::default(),
        );
        assert!(result.converged);
        assert_relative_eq!(result.point, 1.25, epsilon = 1e-6);
        assert_relative_eq!(result.value, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn golden_section_accepts_reversed_bounds() {
        let result = golden_section_max(|x| -(x + 0.5).powi(2), 2.0, -2.0, ScalarSearchConfig::default());
        assert_relative_eq!(result.point, -0.5, epsilon = 1e-6);
    }

    #[test]
    fn bisect_finds_root() {
        let result = bisect(|x| x * x - 2.0, 0.0, 2.0, ScalarSearchConfig::default()).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.point, 2.0_f64.sqrt(), epsilon = 1e-8);
    }

    #[test]
    fn bisect_requires_sign_change() {
        assert!(bisect(|x| x * x + 1.0, -1.0, 1.0, ScalarSearchConfig::default()).is_none());
    }
}
