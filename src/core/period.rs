//! Fixed-granularity periods used as the time-series index.

use crate::error::{DecompositionError, Result};
use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Granularity of the period index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    /// Monday-based weeks.
    Week,
    #[default]
    Month,
    Quarter,
}

impl Granularity {
    /// Number of periods per year, used as the default seasonal cycle.
    pub fn periods_per_year(&self) -> usize {
        match self {
            Granularity::Day => 365,
            Granularity::Week => 52,
            Granularity::Month => 12,
            Granularity::Quarter => 4,
        }
    }
}

impl FromStr for Granularity {
    type Err = DecompositionError;

    /// Accepts full names as well as the single-letter codes `D`, `W`, `M`, `Q`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "day" | "daily" => Ok(Granularity::Day),
            "w" | "week" | "weekly" => Ok(Granularity::Week),
            "m" | "month" | "monthly" => Ok(Granularity::Month),
            "q" | "quarter" | "quarterly" => Ok(Granularity::Quarter),
            other => Err(DecompositionError::Configuration(format!(
                "unknown period granularity '{other}' (expected month, week, day or quarter)"
            ))),
        }
    }
}

/// A time bucket of fixed granularity, identified by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    start: NaiveDate,
    granularity: Granularity,
}

impl Period {
    /// The period of the given granularity that contains `date`.
    pub fn containing(date: NaiveDate, granularity: Granularity) -> Result<Self> {
        let start = match granularity {
            Granularity::Day => Some(date),
            Granularity::Week => date.checked_sub_days(Days::new(
                date.weekday().num_days_from_monday() as u64,
            )),
            Granularity::Month => date.with_day(1),
            Granularity::Quarter => {
                let first_month = (date.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), first_month, 1)
            }
        }
        .ok_or_else(|| {
            DecompositionError::TimestampError(format!("cannot compute period start for {date}"))
        })?;

        Ok(Self { start, granularity })
    }

    /// Monthly period from an explicit year and month pair.
    pub fn from_year_month(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|start| Self {
                start,
                granularity: Granularity::Month,
            })
            .ok_or_else(|| DecompositionError::Format {
                value: format!("{year}-{month}"),
                format: "year + month (1-12)".to_string(),
            })
    }

    /// First day of the period.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Calendar year the period starts in.
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// Position of the period within its yearly cycle (1-based).
    ///
    /// Month → 1..=12, quarter → 1..=4, week → ISO week, day → day of year.
    pub fn cycle_position(&self) -> u32 {
        match self.granularity {
            Granularity::Day => self.start.ordinal(),
            Granularity::Week => self.start.iso_week().week(),
            Granularity::Month => self.start.month(),
            Granularity::Quarter => self.start.month0() / 3 + 1,
        }
    }

    /// The following period.
    pub fn succ(&self) -> Option<Self> {
        let start = match self.granularity {
            Granularity::Day => self.start.checked_add_days(Days::new(1)),
            Granularity::Week => self.start.checked_add_days(Days::new(7)),
            Granularity::Month => self.start.checked_add_months(Months::new(1)),
            Granularity::Quarter => self.start.checked_add_months(Months::new(3)),
        }?;
        Some(Self {
            start,
            granularity: self.granularity,
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity {
            Granularity::Day => write!(f, "{}", self.start.format("%Y-%m-%d")),
            Granularity::Week => {
                let week = self.start.iso_week();
                write!(f, "{}-W{:02}", week.year(), week.week())
            }
            Granularity::Month => write!(f, "{}", self.start.format("%Y-%m")),
            Granularity::Quarter => write!(f, "{}Q{}", self.year(), self.cycle_position()),
        }
    }
}

/// Parse a date string with a `strftime`-style format.
///
/// Formats without a day component (e.g. `"%B %Y"` for `"January 2021"`) resolve
/// to the first day of the month. Datetime formats are truncated to the date.
pub fn parse_date(value: &str, format: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
        return Ok(date);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
        return Ok(datetime.date());
    }
    if let Ok(date) =
        NaiveDate::parse_from_str(&format!("{trimmed} 01"), &format!("{format} %d"))
    {
        return Ok(date);
    }

    Err(DecompositionError::Format {
        value: value.to_string(),
        format: format.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_month_year_strings() {
        assert_eq!(parse_date("January 2021", "%B %Y").unwrap(), date(2021, 1, 1));
        assert_eq!(parse_date(" March 2024 ", "%B %Y").unwrap(), date(2024, 3, 1));
        assert_eq!(parse_date("2022-07", "%Y-%m").unwrap(), date(2022, 7, 1));
    }

    #[test]
    fn parses_full_dates_and_datetimes() {
        assert_eq!(parse_date("2023-05-17", "%Y-%m-%d").unwrap(), date(2023, 5, 17));
        assert_eq!(
            parse_date("2023-05-17 08:30:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            date(2023, 5, 17)
        );
    }

    #[test]
    fn malformed_dates_are_format_errors() {
        let err = parse_date("Q1 2021", "%B %Y").unwrap_err();
        assert_eq!(
            err,
            DecompositionError::Format {
                value: "Q1 2021".to_string(),
                format: "%B %Y".to_string()
            }
        );
        assert!(parse_date("", "%Y-%m-%d").is_err());
    }

    #[test]
    fn period_start_by_granularity() {
        let d = date(2021, 8, 19); // Thursday

        assert_eq!(Period::containing(d, Granularity::Day).unwrap().start(), d);
        assert_eq!(
            Period::containing(d, Granularity::Week).unwrap().start(),
            date(2021, 8, 16)
        );
        assert_eq!(
            Period::containing(d, Granularity::Month).unwrap().start(),
            date(2021, 8, 1)
        );
        assert_eq!(
            Period::containing(d, Granularity::Quarter).unwrap().start(),
            date(2021, 7, 1)
        );
    }

    #[test]
    fn period_display_labels() {
        let d = date(2021, 2, 10);
        assert_eq!(Period::containing(d, Granularity::Month).unwrap().to_string(), "2021-02");
        assert_eq!(Period::containing(d, Granularity::Quarter).unwrap().to_string(), "2021Q1");
        assert_eq!(Period::containing(d, Granularity::Day).unwrap().to_string(), "2021-02-10");
        assert_eq!(Period::containing(d, Granularity::Week).unwrap().to_string(), "2021-W06");
    }

    #[test]
    fn period_succ_advances_one_unit() {
        let jan = Period::from_year_month(2021, 12).unwrap();
        assert_eq!(jan.succ().unwrap(), Period::from_year_month(2022, 1).unwrap());

        let q4 = Period::containing(date(2021, 11, 3), Granularity::Quarter).unwrap();
        assert_eq!(q4.succ().unwrap().start(), date(2022, 1, 1));
    }

    #[test]
    fn year_month_validation() {
        assert!(Period::from_year_month(2021, 13).is_err());
        assert!(Period::from_year_month(2021, 0).is_err());
        assert_eq!(Period::from_year_month(2012, 5).unwrap().cycle_position(), 5);
    }

    #[test]
    fn granularity_from_str() {
        assert_eq!("M".parse::<Granularity>().unwrap(), Granularity::Month);
        assert_eq!("quarter".parse::<Granularity>().unwrap(), Granularity::Quarter);
        assert!(matches!(
            "hourly".parse::<Granularity>(),
            Err(DecompositionError::Configuration(_))
        ));
    }

    #[test]
    fn periods_order_by_start() {
        let a = Period::from_year_month(2021, 3).unwrap();
        let b = Period::from_year_month(2021, 11).unwrap();
        let c = Period::from_year_month(2022, 1).unwrap();
        let mut v = vec![c, a, b];
        v.sort();
        assert_eq!(v, vec![a, b, c]);
    }
}
