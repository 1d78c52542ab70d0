//! Minimal named-column table consumed by the decomposition pipeline.
//!
//! Spreadsheet readers are external; they hand over a [`Dataset`] of nullable
//! cells. The table supports the handful of reshaping steps the admission
//! workflows need before aggregation: renaming, filtering and melting a wide
//! month-per-column sheet into long form.

use crate::error::{DecompositionError, Result};
use serde::Serialize;
use std::fmt;

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Null cells and NaN numbers are missing; zero is not.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Number(v) => v.is_nan(),
            Cell::Text(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// Column-major table with named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. All columns must have the same length and unique names.
    pub fn with_column<S, I, C>(mut self, name: S, cells: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.push_column(name.into(), cells.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    fn push_column(&mut self, name: String, cells: Vec<Cell>) -> Result<()> {
        if self.names.contains(&name) {
            return Err(DecompositionError::InvalidParameter(format!(
                "duplicate column '{name}'"
            )));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != cells.len() {
                return Err(DecompositionError::DimensionMismatch {
                    expected: first.len(),
                    got: cells.len(),
                });
            }
        }
        self.names.push(name);
        self.columns.push(cells);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Cells of a named column.
    pub fn column(&self, name: &str) -> Result<&[Cell]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
            .ok_or_else(|| DecompositionError::Configuration(format!("column '{name}' not found")))
    }

    /// Iterate over `(name, cells)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Cell])> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Rename a column in place.
    pub fn rename_column(mut self, from: &str, to: &str) -> Result<Self> {
        if from != to && self.has_column(to) {
            return Err(DecompositionError::InvalidParameter(format!(
                "duplicate column '{to}'"
            )));
        }
        let idx = self
            .names
            .iter()
            .position(|n| n == from)
            .ok_or_else(|| DecompositionError::Configuration(format!("column '{from}' not found")))?;
        self.names[idx] = to.to_string();
        Ok(self)
    }

    /// Keep only rows where `column` holds the text `value`.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<Self> {
        let keep: Vec<bool> = self
            .column(column)?
            .iter()
            .map(|cell| cell.as_text() == Some(value))
            .collect();
        Ok(self.select_rows(&keep))
    }

    /// Keep only rows where `column` does not hold the text `value`.
    pub fn filter_ne(&self, column: &str, value: &str) -> Result<Self> {
        let keep: Vec<bool> = self
            .column(column)?
            .iter()
            .map(|cell| cell.as_text() != Some(value))
            .collect();
        Ok(self.select_rows(&keep))
    }

    fn select_rows(&self, keep: &[bool]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|col| {
                col.iter()
                    .zip(keep)
                    .filter(|(_, &k)| k)
                    .map(|(cell, _)| cell.clone())
                    .collect()
            })
            .collect();
        Self {
            names: self.names.clone(),
            columns,
        }
    }

    /// Unpivot from wide to long form.
    ///
    /// Every column not listed in `id_vars` becomes a row per original row, its
    /// header stored under `var_name` and its cell under `value_name`. Rows are
    /// ordered column by column, as a spreadsheet melt does.
    pub fn melt(&self, id_vars: &[&str], var_name: &str, value_name: &str) -> Result<Self> {
        let id_columns = id_vars
            .iter()
            .map(|id| self.column(id))
            .collect::<Result<Vec<_>>>()?;

        let value_columns: Vec<(&str, &[Cell])> = self
            .columns()
            .filter(|(name, _)| !id_vars.contains(name))
            .collect();

        let n = self.n_rows();
        let total = n * value_columns.len();
        let mut id_cells: Vec<Vec<Cell>> = vec![Vec::with_capacity(total); id_vars.len()];
        let mut var_cells = Vec::with_capacity(total);
        let mut value_cells = Vec::with_capacity(total);

        for (header, cells) in &value_columns {
            for row in 0..n {
                for (k, id_column) in id_columns.iter().enumerate() {
                    id_cells[k].push(id_column[row].clone());
                }
                var_cells.push(Cell::Text(header.to_string()));
                value_cells.push(cells[row].clone());
            }
        }

        let mut out = Dataset::new();
        for (id, cells) in id_vars.iter().zip(id_cells) {
            out.push_column(id.to_string(), cells)?;
        }
        out.push_column(var_name.to_string(), var_cells)?;
        out.push_column(value_name.to_string(), value_cells)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_sheet() -> Dataset {
        Dataset::new()
            .with_column("disease", ["ARI", "AWD"])
            .unwrap()
            .with_column("province", ["Kabul", "Kabul"])
            .unwrap()
            .with_column("January 2021", [Some(10.0), None])
            .unwrap()
            .with_column("February 2021", [12.0, 3.0])
            .unwrap()
    }

    #[test]
    fn dataset_builds_and_reads_columns() {
        let ds = wide_sheet();
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.n_columns(), 4);
        assert_eq!(ds.column("province").unwrap()[1], Cell::from("Kabul"));
        assert!(matches!(
            ds.column("district"),
            Err(DecompositionError::Configuration(_))
        ));
    }

    #[test]
    fn dataset_rejects_ragged_and_duplicate_columns() {
        let ds = Dataset::new().with_column("a", [1.0, 2.0]).unwrap();
        assert_eq!(
            ds.clone().with_column("b", [1.0]).unwrap_err(),
            DecompositionError::DimensionMismatch {
                expected: 2,
                got: 1
            }
        );
        assert!(ds.with_column("a", [3.0, 4.0]).is_err());
    }

    #[test]
    fn melt_unpivots_month_columns() {
        let long = wide_sheet()
            .melt(&["disease", "province"], "time", "admission")
            .unwrap();

        assert_eq!(long.n_rows(), 4);
        assert_eq!(
            long.column_names(),
            &["disease", "province", "time", "admission"]
        );
        let time = long.column("time").unwrap();
        assert_eq!(time[0], Cell::from("January 2021"));
        assert_eq!(time[3], Cell::from("February 2021"));
        let admission = long.column("admission").unwrap();
        assert_eq!(admission[0], Cell::Number(10.0));
        assert_eq!(admission[1], Cell::Null);
        assert_eq!(long.column("disease").unwrap()[3], Cell::from("AWD"));
    }

    #[test]
    fn filter_and_rename() {
        let ds = wide_sheet()
            .rename_column("disease", "category")
            .unwrap()
            .filter_eq("category", "ARI")
            .unwrap();
        assert_eq!(ds.n_rows(), 1);
        assert_eq!(ds.column("February 2021").unwrap()[0], Cell::Number(12.0));

        let rest = wide_sheet().filter_ne("disease", "ARI").unwrap();
        assert_eq!(rest.n_rows(), 1);
        assert_eq!(rest.column("disease").unwrap()[0], Cell::from("AWD"));
    }

    #[test]
    fn zero_is_not_missing() {
        assert!(!Cell::Number(0.0).is_missing());
        assert!(Cell::Number(f64::NAN).is_missing());
        assert!(Cell::Null.is_missing());
    }
}
