//! Calendar helpers shared by the classification and analysis views.
//!
//! All dates are naive calendar dates. Nothing here looks at time zones.

use std::fmt;
use std::str::FromStr;

use jiff::ToSpan;
use jiff::civil::{Date, DateTime, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

/// Number of weeks in a month grid. Six rows keep the picker height stable.
pub const GRID_WEEKS: usize = 6;

/// The three textual date encodings used across the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `yyyy-mm-dd`, used on the wire and in API paths.
    Backend,
    /// `dd-mm-yyyy`, used in frontend URLs.
    Url,
    /// `dd.mm.yyyy`, used for display.
    Visual,
}

impl DateFormat {
    fn pattern(self) -> &'static str {
        match self {
            DateFormat::Backend => "%Y-%m-%d",
            DateFormat::Url => "%d-%m-%Y",
            DateFormat::Visual => "%d.%m.%Y",
        }
    }

    fn label(self) -> &'static str {
        match self {
            DateFormat::Backend => "yyyy-mm-dd",
            DateFormat::Url => "dd-mm-yyyy",
            DateFormat::Visual => "dd.mm.yyyy",
        }
    }
}

pub fn format_date(date: Date, format: DateFormat) -> String {
    date.strftime(format.pattern()).to_string()
}

pub fn parse_date(input: &str, format: DateFormat) -> Result<Date, CoreError> {
    Date::strptime(format.pattern(), input.trim()).map_err(|_| CoreError::InvalidDate {
        input: input.to_string(),
        expected: format.label(),
    })
}

/// `dd-mm-yyyy-hh:mm`, the stamp prefixed to exported file names.
pub fn format_timestamp_stamp(at: DateTime) -> String {
    at.strftime("%d-%m-%Y-%H:%M").to_string()
}

/// Compare two dates on year, month and day.
pub fn equal_date(a: Date, b: Date) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

pub fn days_in_month(date: Date) -> u8 {
    date.days_in_month().unsigned_abs()
}

/// Calendar quarter (1..=4) a date falls into.
pub fn quarter_of(date: Date) -> u8 {
    (date.month().unsigned_abs() - 1) / 3 + 1
}

pub fn same_quarter(a: Date, b: Date) -> bool {
    a.year() == b.year() && quarter_of(a) == quarter_of(b)
}

/// Every date from `start` through `end`, inclusive. Empty when `end < start`.
pub fn days_between(start: Date, end: Date) -> impl Iterator<Item = Date> {
    start.series(1.day()).take_while(move |d| *d <= end)
}

/// Full calendar weeks covering the month of `date`.
///
/// The first week starts on `week_start` at or before the 1st of the month;
/// days of the neighbouring months pad the grid. The grid always has
/// [`GRID_WEEKS`] rows.
pub fn weeks_for_month(date: Date, week_start: Weekday) -> Vec<[Date; 7]> {
    let first = date.first_of_month();
    let back = (first.weekday().to_monday_zero_offset() - week_start.to_monday_zero_offset())
        .rem_euclid(7);
    let start = first.saturating_sub(i64::from(back).days());

    let days: Vec<Date> = start.series(1.day()).take(GRID_WEEKS * 7).collect();
    days.chunks_exact(7)
        .filter_map(|week| <[Date; 7]>::try_from(week).ok())
        .collect()
}

/// The analysis window granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ViewMode {
    Daily,
    Monthly,
    Quarterly,
}

impl ViewMode {
    /// First day of the window ending at `end`.
    ///
    /// Month arithmetic clamps to the last valid day, so March 31st minus one
    /// month is the last day of February.
    pub fn range_start(self, end: Date) -> Date {
        match self {
            ViewMode::Daily => end,
            ViewMode::Monthly => end.saturating_sub(1.month()),
            ViewMode::Quarterly => end.saturating_sub(3.months()),
        }
    }
}

impl FromStr for ViewMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(ViewMode::Daily),
            "monthly" => Ok(ViewMode::Monthly),
            "quarterly" => Ok(ViewMode::Quarterly),
            other => Err(CoreError::InvalidViewMode(other.to_string())),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewMode::Daily => "daily",
            ViewMode::Monthly => "monthly",
            ViewMode::Quarterly => "quarterly",
        };
        f.write_str(name)
    }
}
