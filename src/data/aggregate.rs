//! Temporal aggregation of observation records into regular series.

use crate::core::{parse_date, Granularity, Period, RegularTimeSeries};
use crate::data::record::{ObservationRecord, RecordDate};
use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Default format of text dates in the admission sheets (`"January 2021"`).
pub const DEFAULT_DATE_FORMAT: &str = "%B %Y";

/// Sums record measures per period, optionally per group.
#[derive(Debug, Clone)]
pub struct TemporalAggregator {
    granularity: Granularity,
    date_format: String,
    excluded_years: BTreeSet<i32>,
}

impl TemporalAggregator {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            excluded_years: BTreeSet::new(),
        }
    }

    /// Format used to parse [`RecordDate::Text`] dates.
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = format.to_string();
        self
    }

    /// Drop records whose period starts in one of these years.
    pub fn with_excluded_years(mut self, years: &[i32]) -> Self {
        self.excluded_years = years.iter().copied().collect();
        self
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Period of a record at the configured granularity.
    ///
    /// Fails with a format error when a text date does not match the format.
    pub fn period_of(&self, record: &ObservationRecord) -> Result<Period> {
        let date = match record.date() {
            RecordDate::Text(value) => parse_date(value, &self.date_format)?,
            RecordDate::YearMonth { year, month } => Period::from_year_month(*year, *month)?.start(),
        };
        Period::containing(date, self.granularity)
    }

    /// Aggregate all records into one series, ignoring group keys.
    pub fn aggregate(&self, records: &[ObservationRecord]) -> Result<RegularTimeSeries> {
        let mut sums: BTreeMap<Period, f64> = BTreeMap::new();
        for record in records {
            if let Some(period) = self.included_period(record)? {
                *sums.entry(period).or_insert(0.0) += record.measure();
            }
        }
        debug!(periods = sums.len(), records = records.len(), "aggregated series");
        into_series(sums)
    }

    /// Aggregate records into one series per distinct group key.
    ///
    /// Records without a group key are skipped with a warning.
    pub fn aggregate_by_group(
        &self,
        records: &[ObservationRecord],
    ) -> Result<BTreeMap<String, RegularTimeSeries>> {
        let mut sums: BTreeMap<String, BTreeMap<Period, f64>> = BTreeMap::new();
        let mut ungrouped = 0usize;

        for record in records {
            let Some(period) = self.included_period(record)? else {
                continue;
            };
            match record.group() {
                Some(group) => {
                    *sums
                        .entry(group.to_string())
                        .or_default()
                        .entry(period)
                        .or_insert(0.0) += record.measure();
                }
                None => ungrouped += 1,
            }
        }

        if ungrouped > 0 {
            warn!(skipped = ungrouped, "records without a group key were skipped");
        }
        debug!(groups = sums.len(), records = records.len(), "aggregated grouped series");

        sums.into_iter()
            .map(|(group, periods)| into_series(periods).map(|ts| (group, ts)))
            .collect()
    }

    fn included_period(&self, record: &ObservationRecord) -> Result<Option<Period>> {
        let period = self.period_of(record)?;
        if self.excluded_years.contains(&period.year()) {
            return Ok(None);
        }
        Ok(Some(period))
    }
}

impl Default for TemporalAggregator {
    fn default() -> Self {
        Self::new(Granularity::Month)
    }
}

fn into_series(sums: BTreeMap<Period, f64>) -> Result<RegularTimeSeries> {
    let (periods, values): (Vec<Period>, Vec<f64>) = sums.into_iter().unzip();
    RegularTimeSeries::new(periods, values)
}
