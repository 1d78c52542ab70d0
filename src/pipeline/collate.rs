//! Flatten grouped decompositions into a long `(group, period, value)` table.

use crate::core::Period;
use crate::error::{DecompositionError, Result};
use crate::pipeline::orchestrator::{DecompositionResult, GroupedDecomposition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the four aligned decomposition components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Observed,
    Trend,
    Seasonal,
    Residual,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Observed,
        Component::Trend,
        Component::Seasonal,
        Component::Residual,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Component::Observed => "observed",
            Component::Trend => "trend",
            Component::Seasonal => "seasonal",
            Component::Residual => "residual",
        }
    }
}

impl FromStr for Component {
    type Err = DecompositionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "observed" => Ok(Component::Observed),
            "trend" => Ok(Component::Trend),
            "seasonal" => Ok(Component::Seasonal),
            "residual" | "resid" => Ok(Component::Residual),
            other => Err(DecompositionError::Configuration(format!(
                "unknown component '{other}' (expected trend, seasonal, residual or observed)"
            ))),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the long table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRow {
    pub group: String,
    pub period: Period,
    pub value: f64,
}

/// Rows for `component`, ordered by group then period.
///
/// Excluded groups have no entry in the results and so produce no rows.
pub fn collate(grouped: &GroupedDecomposition, component: Component) -> Vec<ComponentRow> {
    collate_results(&grouped.results, component)
}

/// [`collate`] over a plain group → result map.
pub fn collate_results(
    results: &BTreeMap<String, DecompositionResult>,
    component: Component,
) -> Vec<ComponentRow> {
    results
        .iter()
        .flat_map(|(group, result)| {
            result
                .periods
                .iter()
                .zip(result.component(component))
                .map(move |(&period, &value)| ComponentRow {
                    group: group.clone(),
                    period,
                    value,
                })
        })
        .collect()
}
