//! Decomposition run configuration.

use crate::core::Granularity;
use crate::data::{TemporalAggregator, DEFAULT_DATE_FORMAT};
use crate::error::{DecompositionError, Result};
use crate::seasonality::DEFAULT_SEASONAL_SMOOTHNESS;
use crate::transform::DEFAULT_CONFIDENCE_LEVEL;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Whether all records form one series or one series per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Single,
    Multiple,
}

impl FromStr for Scope {
    type Err = DecompositionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Scope::Single),
            "multiple" => Ok(Scope::Multiple),
            other => Err(DecompositionError::Configuration(format!(
                "unknown scope '{other}' (expected single or multiple)"
            ))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Single => write!(f, "single"),
            Scope::Multiple => write!(f, "multiple"),
        }
    }
}

/// Configuration for a decomposition run.
///
/// Built with the `with_*` methods or deserialized from TOML:
///
/// ```
/// use admissions_decompose::pipeline::{DecompositionConfig, Scope};
///
/// let config = DecompositionConfig::from_toml_str(
///     r#"
///     scope = "multiple"
///     group_column = "Province"
///     excluded_years = [2023]
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.scope, Scope::Multiple);
/// assert_eq!(config.period, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecompositionConfig {
    /// Period granularity of the aggregated series.
    pub granularity: Granularity,
    /// Format of textual dates in the records.
    pub date_format: String,
    /// Seasonal smoother length (odd, at least 7).
    pub seasonal: usize,
    /// Observations per seasonal cycle.
    pub period: usize,
    pub scope: Scope,
    /// Column holding the group key; required for multiple scope.
    pub group_column: Option<String>,
    /// Years whose records are dropped before aggregation.
    pub excluded_years: Vec<i32>,
    /// Confidence level of the Box-Cox λ interval.
    pub confidence_level: f64,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Month,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            seasonal: DEFAULT_SEASONAL_SMOOTHNESS,
            period: 12,
            scope: Scope::Single,
            group_column: None,
            excluded_years: Vec::new(),
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
        }
    }
}

impl DecompositionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = format.to_string();
        self
    }

    pub fn with_seasonal(mut self, seasonal: usize) -> Self {
        self.seasonal = seasonal;
        self
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Switch to multiple scope keyed by `column`.
    pub fn with_group_column(mut self, column: &str) -> Self {
        self.group_column = Some(column.to_string());
        self.scope = Scope::Multiple;
        self
    }

    pub fn with_excluded_years(mut self, years: &[i32]) -> Self {
        self.excluded_years = years.to_vec();
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| DecompositionError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            DecompositionError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check every parameter before any data is touched.
    pub fn validate(&self) -> Result<()> {
        if self.seasonal < 7 || self.seasonal % 2 == 0 {
            return Err(DecompositionError::Configuration(format!(
                "seasonal smoother length must be an odd integer >= 7, got {}",
                self.seasonal
            )));
        }
        if self.period < 2 {
            return Err(DecompositionError::Configuration(format!(
                "period must be at least 2, got {}",
                self.period
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(DecompositionError::Configuration(format!(
                "confidence level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.date_format.trim().is_empty() {
            return Err(DecompositionError::Configuration(
                "date format must not be empty".to_string(),
            ));
        }
        if self.scope == Scope::Multiple
            && self.group_column.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            return Err(DecompositionError::Configuration(
                "multiple scope requires a group column".to_string(),
            ));
        }
        Ok(())
    }

    /// Aggregator matching this configuration.
    pub fn aggregator(&self) -> TemporalAggregator {
        TemporalAggregator::new(self.granularity)
            .with_date_format(&self.date_format)
            .with_excluded_years(&self.excluded_years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DecompositionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.granularity, Granularity::Month);
        assert_eq!(config.date_format, "%B %Y");
        assert_eq!(config.seasonal, 7);
        assert_eq!(config.period, 12);
        assert_eq!(config.scope, Scope::Single);
        assert!(config.excluded_years.is_empty());
    }

    #[test]
    fn scope_from_str() {
        assert_eq!("single".parse::<Scope>().unwrap(), Scope::Single);
        assert_eq!(" Multiple ".parse::<Scope>().unwrap(), Scope::Multiple);
        assert!(matches!(
            "both".parse::<Scope>(),
            Err(DecompositionError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_invalid_seasonal() {
        for seasonal in [5, 8, 0] {
            let config = DecompositionConfig::new().with_seasonal(seasonal);
            assert!(
                matches!(config.validate(), Err(DecompositionError::Configuration(_))),
                "seasonal = {seasonal} should be rejected"
            );
        }
        assert!(DecompositionConfig::new().with_seasonal(13).validate().is_ok());
    }

    #[test]
    fn rejects_invalid_period_and_level() {
        assert!(DecompositionConfig::new().with_period(1).validate().is_err());
        assert!(DecompositionConfig::new()
            .with_confidence_level(1.0)
            .validate()
            .is_err());
        assert!(DecompositionConfig::new()
            .with_confidence_level(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn multiple_scope_requires_group_column() {
        let config = DecompositionConfig::new().with_scope(Scope::Multiple);
        assert!(matches!(
            config.validate(),
            Err(DecompositionError::Configuration(_))
        ));

        let config = DecompositionConfig::new().with_group_column("Province");
        assert_eq!(config.scope, Scope::Multiple);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_from_toml() {
        let config = DecompositionConfig::from_toml_str(
            r#"
            granularity = "quarter"
            date_format = "%Y-%m-%d"
            seasonal = 9
            period = 4
            confidence_level = 0.9
            "#,
        )
        .unwrap();

        assert_eq!(config.granularity, Granularity::Quarter);
        assert_eq!(config.date_format, "%Y-%m-%d");
        assert_eq!(config.seasonal, 9);
        assert_eq!(config.period, 4);
        assert_eq!(config.scope, Scope::Single);
    }

    #[test]
    fn toml_errors_are_configuration_errors() {
        assert!(matches!(
            DecompositionConfig::from_toml_str("scope = \"everything\""),
            Err(DecompositionError::Configuration(_))
        ));
        assert!(matches!(
            DecompositionConfig::from_toml_str("seasonal = 4"),
            Err(DecompositionError::Configuration(_))
        ));
        assert!(matches!(
            DecompositionConfig::from_toml_str("unknown_key = 1"),
            Err(DecompositionError::Configuration(_))
        ));
        assert!(matches!(
            DecompositionConfig::from_toml_file("/nonexistent/decompose.toml"),
            Err(DecompositionError::Configuration(_))
        ));
    }
}
