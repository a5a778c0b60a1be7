//! Care minutes per station, for one day or summed over a range.

use std::collections::BTreeMap;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use caretracker_core::dates::days_between;
use caretracker_core::models::station::Station;

/// Id of the pseudo-station summing all real stations.
pub const COMBINED_STATION_ID: i64 = -1;
pub const COMBINED_STATION_NAME: &str = "Gesamt";

/// Minutes of one scored patient-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredDay {
    pub station_id: i64,
    pub patient_id: i64,
    pub date: Date,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StationMinutes {
    pub id: i64,
    pub name: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DayMinutes {
    pub date: Date,
    /// Day of month, for charts.
    pub day: i8,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StationSeries {
    pub id: i64,
    pub name: String,
    pub sum: u32,
    pub data: Vec<DayMinutes>,
}

/// Minutes per roster station for `today`.
///
/// Every station appears, with 0 if nothing is scored. Results for other
/// days or for stations outside the roster are ignored.
pub fn aggregate_daily(roster: &[Station], results: &[ScoredDay], today: Date) -> Vec<StationMinutes> {
    let mut totals: BTreeMap<i64, u32> = BTreeMap::new();
    for r in results.iter().filter(|r| r.date == today) {
        *totals.entry(r.station_id).or_default() += r.minutes;
    }

    roster
        .iter()
        .map(|station| StationMinutes {
            id: station.id,
            name: station.name.clone(),
            minutes: totals.get(&station.id).copied().unwrap_or(0),
        })
        .collect()
}

/// Per-day minutes of every roster station over `start..=end`, zero-filled.
pub fn aggregate_series(
    roster: &[Station],
    results: &[ScoredDay],
    start: Date,
    end: Date,
) -> Vec<StationSeries> {
    let days: Vec<Date> = days_between(start, end).collect();
    let mut totals: BTreeMap<(i64, Date), u32> = BTreeMap::new();
    for r in results.iter().filter(|r| r.date >= start && r.date <= end) {
        *totals.entry((r.station_id, r.date)).or_default() += r.minutes;
    }

    roster
        .iter()
        .map(|station| {
            let data: Vec<DayMinutes> = days
                .iter()
                .map(|&date| DayMinutes {
                    date,
                    day: date.day(),
                    minutes: totals.get(&(station.id, date)).copied().unwrap_or(0),
                })
                .collect();
            StationSeries {
                id: station.id,
                name: station.name.clone(),
                sum: data.iter().map(|d| d.minutes).sum(),
                data,
            }
        })
        .collect()
}

/// Sum of all stations as one extra entry. Existing combined entries are
/// skipped so the total is never counted twice.
pub fn combined_daily(stations: &[StationMinutes]) -> StationMinutes {
    StationMinutes {
        id: COMBINED_STATION_ID,
        name: COMBINED_STATION_NAME.to_string(),
        minutes: stations
            .iter()
            .filter(|s| s.id != COMBINED_STATION_ID)
            .map(|s| s.minutes)
            .sum(),
    }
}

/// Day-by-day sum of all series. Series are expected to share their days;
/// a day missing from one series counts as zero there.
pub fn combined_series(series: &[StationSeries]) -> StationSeries {
    let mut per_day: BTreeMap<Date, u32> = BTreeMap::new();
    for s in series.iter().filter(|s| s.id != COMBINED_STATION_ID) {
        for d in &s.data {
            *per_day.entry(d.date).or_default() += d.minutes;
        }
    }

    let data: Vec<DayMinutes> = per_day
        .into_iter()
        .map(|(date, minutes)| DayMinutes {
            date,
            day: date.day(),
            minutes,
        })
        .collect();
    StationSeries {
        id: COMBINED_STATION_ID,
        name: COMBINED_STATION_NAME.to_string(),
        sum: data.iter().map(|d| d.minutes).sum(),
        data,
    }
}

/// Daily analysis with the combined entry appended.
pub fn daily_with_total(roster: &[Station], results: &[ScoredDay], today: Date) -> Vec<StationMinutes> {
    let mut stations = aggregate_daily(roster, results, today);
    let total = combined_daily(&stations);
    stations.push(total);
    stations
}

/// Range analysis ending at `end` (inclusive) with the combined series appended.
pub fn series_with_total(
    roster: &[Station],
    results: &[ScoredDay],
    start: Date,
    end: Date,
) -> Vec<StationSeries> {
    let mut series = aggregate_series(roster, results, start, end);
    let total = combined_series(&series);
    series.push(total);
    series
}

