//! Variance-stabilizing transformations for time series.
//!
//! # Example
//!
//! ```
//! use admissions_decompose::transform::{boxcox_fit, inv_boxcox};
//!
//! let series = vec![12.0, 30.0, 45.0, 18.0, 7.0, 66.0, 25.0, 14.0];
//!
//! // Maximum likelihood λ with a 95% confidence interval
//! let fit = boxcox_fit(&series, 0.95).unwrap();
//! assert!(fit.ci_lower <= fit.lambda && fit.lambda <= fit.ci_upper);
//!
//! // Back to the original scale
//! let recovered = inv_boxcox(&fit.data, fit.lambda);
//! assert!((recovered[0] - 12.0).abs() < 1e-6);
//! ```

pub mod boxcox;

pub use boxcox::{
    boxcox, boxcox_fit, boxcox_lambda, boxcox_llf, inv_boxcox, BoxCoxFit,
    VarianceStabilizer, DEFAULT_CONFIDENCE_LEVEL,
};
