//! Decomposition orchestration: scale decision, STL, back-transformation and
//! per-group retry with zero imputation.

use crate::core::{Period, RegularTimeSeries};
use crate::data::{extract_records, Dataset, ObservationRecord, RecordSchema};
use crate::error::{DecompositionError, Result};
use crate::pipeline::collate::Component;
use crate::pipeline::config::{DecompositionConfig, Scope};
use crate::pipeline::decision::ScaleDecision;
use crate::pipeline::imputation::{impute_zeros, zero_count};
use crate::seasonality::{seasonal_subseries, strength, SeasonalSubseries, STL};
use crate::transform::{inv_boxcox, VarianceStabilizer};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Additive decomposition of one series on its original measurement scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecompositionResult {
    pub periods: Vec<Period>,
    pub observed: Vec<f64>,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    /// Scale the STL ran on.
    pub scale: ScaleDecision,
    /// Maximum likelihood Box-Cox λ.
    pub lambda: f64,
    /// Confidence interval of λ that drove the scale decision.
    pub lambda_interval: (f64, f64),
}

impl DecompositionResult {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn component(&self, component: Component) -> &[f64] {
        match component {
            Component::Observed => &self.observed,
            Component::Trend => &self.trend,
            Component::Seasonal => &self.seasonal,
            Component::Residual => &self.residual,
        }
    }

    /// Seasonal strength on the original scale (0 to 1).
    pub fn seasonal_strength(&self) -> f64 {
        strength(&self.seasonal, &self.residual)
    }

    /// Trend strength on the original scale (0 to 1).
    pub fn trend_strength(&self) -> f64 {
        strength(&self.trend, &self.residual)
    }

    /// Seasonal component pivoted by cycle position and year.
    pub fn seasonal_subseries(&self) -> Result<SeasonalSubseries> {
        seasonal_subseries(&self.periods, &self.seasonal)
    }
}

/// A group excluded after its retry failed.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFailure {
    pub group: String,
    pub error: DecompositionError,
}

/// How one group went through the attempt/retry cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupOutcome {
    pub group: String,
    /// 1 when the first attempt succeeded, 2 after a retry.
    pub attempts: usize,
    /// Whether the retry ran on a series with zeros or missing values filled.
    pub imputed: bool,
    /// Error of the first attempt, if it failed.
    pub first_error: Option<DecompositionError>,
    pub succeeded: bool,
}

/// Results of a multiple-scope run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedDecomposition {
    pub results: BTreeMap<String, DecompositionResult>,
    pub failures: Vec<GroupFailure>,
    pub outcomes: Vec<GroupOutcome>,
}

impl GroupedDecomposition {
    /// Number of successfully decomposed groups.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, group: &str) -> Option<&DecompositionResult> {
        self.results.get(group)
    }

    /// Successful group keys in ascending order.
    pub fn groups(&self) -> impl Iterator<Item = &str> + '_ {
        self.results.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DecompositionResult)> + '_ {
        self.results.iter().map(|(g, r)| (g.as_str(), r))
    }

    /// Groups whose series was imputed before the retry, whatever its result.
    pub fn imputed_groups(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.imputed)
            .map(|o| o.group.as_str())
            .collect()
    }

    pub fn outcome(&self, group: &str) -> Option<&GroupOutcome> {
        self.outcomes.iter().find(|o| o.group == group)
    }
}

/// Output of [`DecompositionOrchestrator::decompose_records`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecompositionOutput {
    Single(DecompositionResult),
    Multiple(GroupedDecomposition),
}

impl DecompositionOutput {
    pub fn single(&self) -> Option<&DecompositionResult> {
        match self {
            DecompositionOutput::Single(result) => Some(result),
            DecompositionOutput::Multiple(_) => None,
        }
    }

    pub fn multiple(&self) -> Option<&GroupedDecomposition> {
        match self {
            DecompositionOutput::Single(_) => None,
            DecompositionOutput::Multiple(grouped) => Some(grouped),
        }
    }
}

/// Per-group attempt cycle.
enum GroupState {
    Attempt,
    Failed(DecompositionError),
    Retry(RegularTimeSeries),
    Succeeded(DecompositionResult),
    Excluded(DecompositionError),
}

/// Runs the decomposition pipeline for one series or for every group.
#[derive(Debug, Clone)]
pub struct DecompositionOrchestrator {
    config: DecompositionConfig,
    stabilizer: VarianceStabilizer,
    stl: STL,
}

impl DecompositionOrchestrator {
    /// Validate the configuration and build the pipeline.
    pub fn new(config: DecompositionConfig) -> Result<Self> {
        config.validate()?;
        let stabilizer = VarianceStabilizer::new(config.confidence_level)?;
        let stl = STL::new(config.period).with_seasonal_smoothness(config.seasonal);
        Ok(Self {
            config,
            stabilizer,
            stl,
        })
    }

    pub fn config(&self) -> &DecompositionConfig {
        &self.config
    }

    /// Decompose a single series.
    ///
    /// Fits Box-Cox λ with its confidence interval, runs STL on the raw scale
    /// when the interval contains 1 and on the transformed scale otherwise,
    /// and returns components on the original scale.
    pub fn decompose_series(&self, series: &RegularTimeSeries) -> Result<DecompositionResult> {
        let gaps = series.gaps();
        if let Some(first) = gaps.first() {
            warn!(
                missing_periods = gaps.len(),
                first = %first,
                "series has absent periods; decomposing the observed periods as contiguous"
            );
        }
        let fit = self.stabilizer.fit(series)?;
        let scale = ScaleDecision::from_interval(fit.lambda, fit.ci_lower, fit.ci_upper);
        debug!(
            lambda = fit.lambda,
            ci_lower = fit.ci_lower,
            ci_upper = fit.ci_upper,
            %scale,
            "scale decision"
        );

        let periods = series.periods().to_vec();
        let lambda_interval = (fit.ci_lower, fit.ci_upper);

        match scale {
            ScaleDecision::Raw => {
                let stl = self.stl.decompose(series.values())?;
                Ok(DecompositionResult {
                    periods,
                    observed: series.values().to_vec(),
                    trend: stl.trend,
                    seasonal: stl.seasonal,
                    residual: stl.remainder,
                    scale,
                    lambda: fit.lambda,
                    lambda_interval,
                })
            }
            ScaleDecision::Transformed => {
                let stl = self.stl.decompose(&fit.data)?;
                let observed = series.values().to_vec();
                let trend = inv_boxcox(&stl.trend, fit.lambda);
                let level: Vec<f64> = stl
                    .trend
                    .iter()
                    .zip(&stl.seasonal)
                    .map(|(t, s)| t + s)
                    .collect();
                let seasonal: Vec<f64> = inv_boxcox(&level, fit.lambda)
                    .iter()
                    .zip(&trend)
                    .map(|(ts, t)| ts - t)
                    .collect();
                let residual: Vec<f64> = observed
                    .iter()
                    .zip(&trend)
                    .zip(&seasonal)
                    .map(|((y, t), s)| y - t - s)
                    .collect();

                for (name, values) in [
                    ("trend", &trend),
                    ("seasonal", &seasonal),
                    ("residual", &residual),
                ] {
                    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                        return Err(DecompositionError::ComputationError(format!(
                            "{name} component is not finite at {} after inverse Box-Cox (lambda = {})",
                            periods[index], fit.lambda
                        )));
                    }
                }

                Ok(DecompositionResult {
                    periods,
                    observed,
                    trend,
                    seasonal,
                    residual,
                    scale,
                    lambda: fit.lambda,
                    lambda_interval,
                })
            }
        }
    }

    /// Aggregate records and decompose them according to the configured scope.
    ///
    /// Single scope propagates any error. Multiple scope only fails on
    /// aggregation errors; per-group failures are retried once after zero
    /// imputation and then recorded as [`GroupFailure`]s.
    pub fn decompose_records(&self, records: &[ObservationRecord]) -> Result<DecompositionOutput> {
        let aggregator = self.config.aggregator();
        match self.config.scope {
            Scope::Single => {
                let series = aggregator.aggregate(records)?;
                self.decompose_series(&series).map(DecompositionOutput::Single)
            }
            Scope::Multiple => {
                let groups = aggregator.aggregate_by_group(records)?;
                Ok(DecompositionOutput::Multiple(self.decompose_groups(&groups)))
            }
        }
    }

    /// Decompose every group independently.
    pub fn decompose_groups(&self, groups: &BTreeMap<String, RegularTimeSeries>) -> GroupedDecomposition {
        let mut grouped = GroupedDecomposition::default();

        for (group, series) in groups {
            let (state, outcome) = self.run_group(group, series);
            match state {
                Ok(result) => {
                    grouped.results.insert(group.clone(), result);
                }
                Err(error) => grouped.failures.push(GroupFailure {
                    group: group.clone(),
                    error,
                }),
            }
            grouped.outcomes.push(outcome);
        }

        debug!(
            succeeded = grouped.results.len(),
            excluded = grouped.failures.len(),
            "grouped decomposition finished"
        );
        grouped
    }

    /// Extract records from a dataset and decompose them.
    ///
    /// In multiple scope the configured group column overrides the schema's
    /// and must exist in the dataset.
    pub fn decompose_dataset(&self, dataset: &Dataset, schema: &RecordSchema) -> Result<DecompositionOutput> {
        let schema = match (self.config.scope, self.config.group_column.as_deref()) {
            (Scope::Multiple, Some(column)) => {
                if !dataset.has_column(column) {
                    return Err(DecompositionError::Configuration(format!(
                        "group column '{column}' not found in dataset"
                    )));
                }
                schema.clone().with_group_column(column)
            }
            (Scope::Multiple, None) => {
                return Err(DecompositionError::Configuration(
                    "multiple scope requires a group column".to_string(),
                ))
            }
            (Scope::Single, _) => schema.clone(),
        };

        let records = extract_records(dataset, &schema)?;
        self.decompose_records(&records)
    }

    fn run_group(&self, group: &str, series: &RegularTimeSeries) -> (Result<DecompositionResult>, GroupOutcome) {
        let mut outcome = GroupOutcome {
            group: group.to_string(),
            attempts: 0,
            imputed: false,
            first_error: None,
            succeeded: false,
        };
        let mut state = GroupState::Attempt;

        loop {
            state = match state {
                GroupState::Attempt => {
                    outcome.attempts += 1;
                    match self.decompose_series(series) {
                        Ok(result) => GroupState::Succeeded(result),
                        Err(error) => GroupState::Failed(error),
                    }
                }
                GroupState::Failed(error) if outcome.attempts == 1 => {
                    let zeros = zero_count(series);
                    let missing = series.missing_count();
                    let patchable = zeros + missing > 0;
                    if patchable {
                        info!(group, %error, zeros, missing, "decomposition failed; treating zeros as missing and retrying");
                    } else {
                        info!(group, %error, "decomposition failed; nothing to impute, retrying unchanged");
                    }
                    outcome.first_error = Some(error);
                    match impute_zeros(series) {
                        Ok(patched) => {
                            outcome.imputed = patchable;
                            GroupState::Retry(patched)
                        }
                        Err(error) => GroupState::Excluded(error),
                    }
                }
                GroupState::Failed(error) => GroupState::Excluded(error),
                GroupState::Retry(patched) => {
                    outcome.attempts += 1;
                    match self.decompose_series(&patched) {
                        Ok(result) => {
                            info!(group, "decomposition succeeded after imputation");
                            GroupState::Succeeded(result)
                        }
                        Err(error) => GroupState::Failed(error),
                    }
                }
                GroupState::Succeeded(result) => {
                    outcome.succeeded = true;
                    return (Ok(result), outcome);
                }
                GroupState::Excluded(error) => {
                    warn!(group, %error, attempts = outcome.attempts, "group excluded from decomposition");
                    return (Err(error), outcome);
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;
    use approx::assert_relative_eq;

    fn monthly(values: &[f64]) -> RegularTimeSeries {
        let mut periods = Vec::with_capacity(values.len());
        let mut p = Period::from_year_month(2017, 1).unwrap();
        for _ in 0..values.len() {
            periods.push(p);
            p = p.succ().unwrap();
        }
        RegularTimeSeries::new(periods, values.to_vec()).unwrap()
    }

    fn seasonal_counts(n: usize, base: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let season = (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin();
                (base + 0.5 * i as f64 + 0.3 * base * season).round()
            })
            .collect()
    }

    /// Multiplicative seasonality with growing amplitude.
    fn multiplicative_counts(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let season = 1.0 + 0.6 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin();
                (5.0 * (0.06 * i as f64).exp() * season).max(0.5)
            })
            .collect()
    }

    fn assert_identity(result: &DecompositionResult) {
        for i in 0..result.len() {
            let sum = result.trend[i] + result.seasonal[i] + result.residual[i];
            assert_relative_eq!(result.observed[i], sum, max_relative = 1e-6, epsilon = 1e-9);
        }
    }

    #[test]
    fn rejects_invalid_configuration() {
        let config = DecompositionConfig::new().with_seasonal(6);
        assert!(matches!(
            DecompositionOrchestrator::new(config),
            Err(DecompositionError::Configuration(_))
        ));
    }

    #[test]
    fn decomposes_series_with_identity() {
        let orchestrator = DecompositionOrchestrator::new(DecompositionConfig::default()).unwrap();
        let series = monthly(&seasonal_counts(48, 100.0));

        let result = orchestrator.decompose_series(&series).unwrap();

        assert_eq!(result.len(), 48);
        assert_eq!(result.periods, series.periods());
        assert_eq!(result.observed, series.values());
        assert_identity(&result);
        let (lo, hi) = result.lambda_interval;
        assert_eq!(result.scale, ScaleDecision::from_interval(result.lambda, lo, hi));
    }

    #[test]
    fn transformed_path_reconciles_to_original_scale() {
        let orchestrator = DecompositionOrchestrator::new(DecompositionConfig::default()).unwrap();
        let series = monthly(&multiplicative_counts(72));

        let result = orchestrator.decompose_series(&series).unwrap();

        assert_eq!(result.scale, ScaleDecision::Transformed);
        assert_eq!(result.observed, series.values());
        assert!(result.trend.iter().all(|&t| t > 0.0));
        assert_identity(&result);
    }

    #[test]
    fn single_scope_propagates_errors() {
        let orchestrator = DecompositionOrchestrator::new(DecompositionConfig::default()).unwrap();
        let mut values = seasonal_counts(36, 50.0);
        values[10] = 0.0;
        assert!(matches!(
            orchestrator.decompose_series(&monthly(&values)),
            Err(DecompositionError::Domain { index: 10, .. })
        ));

        let short = monthly(&seasonal_counts(20, 50.0));
        assert_eq!(
            orchestrator.decompose_series(&short).unwrap_err(),
            DecompositionError::InsufficientData { needed: 24, got: 20 }
        );
    }

    #[test]
    fn groups_retry_once_after_imputation() {
        let orchestrator =
            DecompositionOrchestrator::new(DecompositionConfig::new().with_group_column("province")).unwrap();

        let mut with_zeros = seasonal_counts(36, 80.0);
        for v in &mut with_zeros[12..18] {
            *v = 0.0;
        }
        let mut groups = BTreeMap::new();
        groups.insert("Kunene".to_string(), monthly(&with_zeros));
        groups.insert("Omusati".to_string(), monthly(&seasonal_counts(36, 120.0)));
        groups.insert("Zambezi".to_string(), monthly(&seasonal_counts(18, 40.0)));

        let grouped = orchestrator.decompose_groups(&groups);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.groups().collect::<Vec<_>>(), vec!["Kunene", "Omusati"]);
        assert_eq!(grouped.failures.len(), 1);
        assert_eq!(grouped.failures[0].group, "Zambezi");
        assert_eq!(
            grouped.failures[0].error,
            DecompositionError::InsufficientData { needed: 24, got: 18 }
        );

        let kunene = grouped.outcome("Kunene").unwrap();
        assert_eq!(kunene.attempts, 2);
        assert!(kunene.imputed && kunene.succeeded);
        assert!(matches!(kunene.first_error, Some(DecompositionError::Domain { index: 12, .. })));
        assert_eq!(grouped.get("Kunene").unwrap().observed[13], with_zeros[11]);

        let omusati = grouped.outcome("Omusati").unwrap();
        assert_eq!(omusati.attempts, 1);
        assert!(!omusati.imputed);

        // Zambezi has no zeros, so its retry runs on the unchanged series.
        let zambezi = grouped.outcome("Zambezi").unwrap();
        assert_eq!(zambezi.attempts, 2);
        assert!(!zambezi.imputed && !zambezi.succeeded);

        assert_eq!(grouped.imputed_groups(), vec!["Kunene"]);
    }

    #[test]
    fn absent_periods_are_decomposed_as_contiguous() {
        let orchestrator = DecompositionOrchestrator::new(DecompositionConfig::default()).unwrap();
        let full = monthly(&seasonal_counts(40, 90.0));
        let mut periods = full.periods().to_vec();
        let mut values = full.values().to_vec();
        // June 2018 never reported.
        let missing = periods.remove(17);
        values.remove(17);
        let series = RegularTimeSeries::new(periods, values).unwrap();
        assert_eq!(missing, Period::from_year_month(2018, 6).unwrap());
        assert_eq!(series.gaps(), vec![missing]);

        let result = orchestrator.decompose_series(&series).unwrap();
        assert_eq!(result.len(), 39);
        assert_identity(&result);
    }

    #[test]
    fn decompose_dataset_requires_group_column() {
        let dataset = Dataset::new()
            .with_column("Year", vec![Cell::from(2020_i64)])
            .unwrap()
            .with_column("Month", vec![Cell::from(1_i64)])
            .unwrap()
            .with_column("SAM", vec![Cell::from(3.0)])
            .unwrap();
        let schema = RecordSchema::year_month("Year", "Month", &["SAM"]);
        let orchestrator =
            DecompositionOrchestrator::new(DecompositionConfig::new().with_group_column("Province")).unwrap();

        assert!(matches!(
            orchestrator.decompose_dataset(&dataset, &schema),
            Err(DecompositionError::Configuration(_))
        ));
    }

    #[test]
    fn decompose_dataset_single_scope() {
        let values = seasonal_counts(36, 60.0);
        let years: Vec<Cell> = (0..36).map(|i| Cell::from(2018 + i as i64 / 12)).collect();
        let months: Vec<Cell> = (0..36).map(|i| Cell::from(1 + i as i64 % 12)).collect();
        let sam: Vec<Cell> = values.iter().map(|v| Cell::from((v / 2.0).floor())).collect();
        let mam: Vec<Cell> = values.iter().map(|v| Cell::from(v - (v / 2.0).floor())).collect();
        let dataset = Dataset::new()
            .with_column("Year", years)
            .unwrap()
            .with_column("Month", months)
            .unwrap()
            .with_column("SAM", sam)
            .unwrap()
            .with_column("MAM", mam)
            .unwrap();

        let orchestrator = DecompositionOrchestrator::new(DecompositionConfig::default()).unwrap();
        let output = orchestrator
            .decompose_dataset(&dataset, &RecordSchema::year_month("Year", "Month", &["SAM", "MAM"]))
            .unwrap();

        let result = output.single().unwrap();
        assert!(output.multiple().is_none());
        assert_eq!(result.observed, values);
        assert_identity(result);
    }
}
