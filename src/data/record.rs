//! Row-level admission observations and their extraction from a [`Dataset`].

use crate::data::dataset::{Cell, Dataset};
use crate::error::{DecompositionError, Result};
use serde::{Deserialize, Serialize};

/// The date-like field of an observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecordDate {
    /// A date string, parsed with the aggregator's date format.
    Text(String),
    /// An explicit year and month pair.
    YearMonth { year: i32, month: u32 },
}

/// One observation: optional group key, date and a non-negative count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRecord {
    group: Option<String>,
    date: RecordDate,
    measure: f64,
}

impl ObservationRecord {
    /// Create a record. The measure is a count and must be finite and non-negative.
    pub fn new(group: Option<String>, date: RecordDate, measure: f64) -> Result<Self> {
        if !measure.is_finite() || measure < 0.0 {
            return Err(DecompositionError::InvalidParameter(format!(
                "measure must be a finite non-negative count, got {measure}"
            )));
        }
        Ok(Self {
            group,
            date,
            measure,
        })
    }

    /// Record dated by a string such as `"January 2021"`.
    pub fn dated(group: Option<&str>, date: &str, measure: f64) -> Result<Self> {
        Self::new(
            group.map(str::to_string),
            RecordDate::Text(date.to_string()),
            measure,
        )
    }

    /// Record dated by an explicit year and month.
    pub fn monthly(group: Option<&str>, year: i32, month: u32, measure: f64) -> Result<Self> {
        Self::new(
            group.map(str::to_string),
            RecordDate::YearMonth { year, month },
            measure,
        )
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn date(&self) -> &RecordDate {
        &self.date
    }

    pub fn measure(&self) -> f64 {
        self.measure
    }
}

/// Where the date of each row lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateColumns {
    /// A single text column (e.g. `"time"` holding `"January 2021"`).
    Text { column: String },
    /// Separate integer year and month columns.
    YearMonth { year: String, month: String },
}

/// Column mapping from a [`Dataset`] to [`ObservationRecord`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub group_column: Option<String>,
    pub date: DateColumns,
    /// Summed per row, e.g. `["sam", "mam"]` for global acute malnutrition.
    pub measure_columns: Vec<String>,
}

impl RecordSchema {
    /// Schema with a text date column and a single measure column.
    pub fn text_date(date_column: &str, measure_column: &str) -> Self {
        Self {
            group_column: None,
            date: DateColumns::Text {
                column: date_column.to_string(),
            },
            measure_columns: vec![measure_column.to_string()],
        }
    }

    /// Schema with year/month columns and one or more summed measure columns.
    pub fn year_month(year_column: &str, month_column: &str, measure_columns: &[&str]) -> Self {
        Self {
            group_column: None,
            date: DateColumns::YearMonth {
                year: year_column.to_string(),
                month: month_column.to_string(),
            },
            measure_columns: measure_columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_group_column(mut self, column: &str) -> Self {
        self.group_column = Some(column.to_string());
        self
    }
}

/// Extract observation records from a dataset.
///
/// Null measure cells contribute zero to the row sum; a row whose measures are
/// all null still yields a record, so its period is kept. Null group cells give
/// a record without a group key.
pub fn extract_records(dataset: &Dataset, schema: &RecordSchema) -> Result<Vec<ObservationRecord>> {
    if schema.measure_columns.is_empty() {
        return Err(DecompositionError::Configuration(
            "at least one measure column is required".to_string(),
        ));
    }

    let groups = schema
        .group_column
        .as_deref()
        .map(|c| dataset.column(c))
        .transpose()?;
    let measures = schema
        .measure_columns
        .iter()
        .map(|c| dataset.column(c).map(|cells| (c.as_str(), cells)))
        .collect::<Result<Vec<_>>>()?;

    let dates: Vec<RecordDate> = match &schema.date {
        DateColumns::Text { column } => dataset
            .column(column)?
            .iter()
            .map(|cell| match cell {
                Cell::Text(s) => Ok(RecordDate::Text(s.clone())),
                other => Err(DecompositionError::Format {
                    value: other.to_string(),
                    format: format!("text date in column '{column}'"),
                }),
            })
            .collect::<Result<_>>()?,
        DateColumns::YearMonth { year, month } => {
            let years = dataset.column(year)?;
            let months = dataset.column(month)?;
            years
                .iter()
                .zip(months)
                .map(|(y, m)| {
                    Ok(RecordDate::YearMonth {
                        year: integer_cell(y, year)?,
                        month: integer_cell(m, month)?,
                    })
                })
                .collect::<Result<_>>()?
        }
    };

    dates
        .into_iter()
        .enumerate()
        .map(|(row, date)| {
            let mut measure = 0.0;
            for (name, cells) in &measures {
                measure += numeric_cell(&cells[row], name)?.unwrap_or(0.0);
            }
            let group = groups
                .and_then(|cells| group_key(&cells[row]))
                .filter(|g| !g.is_empty());
            ObservationRecord::new(group, date, measure)
        })
        .collect()
}

fn numeric_cell(cell: &Cell, column: &str) -> Result<Option<f64>> {
    match cell {
        Cell::Null => Ok(None),
        Cell::Number(v) if v.is_nan() => Ok(None),
        Cell::Number(v) => Ok(Some(*v)),
        Cell::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| DecompositionError::Format {
                value: s.clone(),
                format: format!("number in column '{column}'"),
            }),
    }
}

/// Whole number in a cell, rejected when it does not fit `T`.
fn integer_cell<T: TryFrom<i64>>(cell: &Cell, column: &str) -> Result<T> {
    let invalid = || DecompositionError::Format {
        value: cell.to_string(),
        format: format!("integer in column '{column}'"),
    };
    match numeric_cell(cell, column)? {
        Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            T::try_from(v as i64).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

fn group_key(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Null => None,
        Cell::Number(v) if v.is_nan() => None,
        other => Some(other.to_string().trim().to_string()),
    }
}
