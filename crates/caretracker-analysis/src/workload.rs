//! Caregiver workload: what the regulation suggests versus who was on shift.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use caretracker_core::dates::days_in_month;
use caretracker_core::models::station::Station;
use caretracker_core::models::workload::{MonthlyWorkload, Shift, StationWorkload};

/// Working-time constants behind the caregiver suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct StaffingParams {
    /// Contract hours of one full-time caregiver per week.
    pub weekly_hours: f64,
    pub shift_hours: f64,
    /// Patients one caregiver may look after at night.
    pub night_patients_per_caregiver: f64,
}

impl Default for StaffingParams {
    fn default() -> Self {
        Self {
            weekly_hours: 38.5,
            shift_hours: 8.0,
            night_patients_per_caregiver: 20.0,
        }
    }
}

/// Day-shift workload of one station from the minutes of its scored patients.
pub fn daily_workload(
    station_id: i64,
    date: Date,
    minutes: &[u32],
    caregivers_total: f64,
    params: &StaffingParams,
) -> StationWorkload {
    let minutes_total: u32 = minutes.iter().sum();
    let shift_minutes = params.shift_hours * 60.0;
    let suggested = if shift_minutes > 0.0 {
        f64::from(minutes_total) / shift_minutes
    } else {
        0.0
    };

    StationWorkload {
        station_id,
        date,
        shift: Shift::Day,
        patients_total: count(minutes.len()),
        caregivers_total,
        minutes_total,
        suggested_caregivers: Some(round2(suggested)),
    }
}

/// Night-shift workload of one station from the patients present overnight.
pub fn night_workload(
    station: &Station,
    date: Date,
    patients_total: u32,
    caregivers_total: f64,
) -> StationWorkload {
    StationWorkload {
        station_id: station.id,
        date,
        shift: Shift::Night,
        patients_total,
        caregivers_total,
        minutes_total: 0,
        suggested_caregivers: Some(night_caregivers(
            f64::from(patients_total),
            station.max_patients_per_caregiver,
        )),
    }
}

/// Caregivers needed at night for `patients`. A staffed station always
/// needs at least one.
pub fn night_caregivers(patients: f64, max_patients_per_caregiver: f64) -> f64 {
    if max_patients_per_caregiver <= 0.0 {
        return 1.0;
    }
    round2((patients / max_patients_per_caregiver).max(1.0))
}

/// Monthly averages of one station and shift. `month` may be any day of the
/// month; records of other stations, shifts or months are ignored.
pub fn monthly_workload(
    station_id: i64,
    month: Date,
    shift: Shift,
    records: &[StationWorkload],
    params: &StaffingParams,
) -> MonthlyWorkload {
    let days = f64::from(days_in_month(month));
    let first = month.first_of_month();

    let mut patients_total = 0u32;
    let mut caregivers_total = 0.0;
    let mut minutes_total = 0u32;
    for r in records.iter().filter(|r| {
        r.station_id == station_id && r.shift == shift && r.date.first_of_month() == first
    }) {
        patients_total += r.patients_total;
        caregivers_total += r.caregivers_total;
        minutes_total += r.minutes_total;
    }

    let patients_avg = f64::from(patients_total) / days;
    let actual_caregivers_avg = caregivers_total / days;
    let suggested_caregivers_avg = match shift {
        Shift::Day => f64::from(minutes_total) / params.weekly_hours / days,
        Shift::Night => {
            let per_caregiver = if caregivers_total > 0.0 {
                f64::from(patients_total) / caregivers_total
            } else {
                0.0
            };
            night_caregivers(per_caregiver, params.night_patients_per_caregiver)
        }
    };
    let shifts_per_caregiver = if actual_caregivers_avg > 0.0 {
        suggested_caregivers_avg / actual_caregivers_avg
    } else {
        0.0
    };

    MonthlyWorkload {
        station_id,
        month: first,
        shift,
        patients_avg: round2(patients_avg),
        actual_caregivers_avg: round2(actual_caregivers_avg),
        suggested_caregivers_avg: round2(suggested_caregivers_avg),
        minutes_total,
        shifts_per_caregiver: round2(shifts_per_caregiver),
    }
}

/// One day of the should-vs-is chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StaffingPoint {
    pub date: Date,
    pub should: f64,
    pub is: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShouldVsIs {
    pub station_id: i64,
    pub station_name: String,
    pub dataset_day: Vec<StaffingPoint>,
    pub dataset_night: Vec<StaffingPoint>,
}

/// Suggested versus actual caregivers per station and shift over
/// `start..=end`, newest day first. Days without a workload record are
/// left out.
pub fn should_vs_is(
    stations: &[Station],
    workloads: &[StationWorkload],
    start: Date,
    end: Date,
    params: &StaffingParams,
) -> Vec<ShouldVsIs> {
    stations
        .iter()
        .map(|station| {
            let dataset = |shift: Shift| {
                let mut points: Vec<StaffingPoint> = workloads
                    .iter()
                    .filter(|w| {
                        w.station_id == station.id
                            && w.shift == shift
                            && w.date >= start
                            && w.date <= end
                    })
                    .map(|w| StaffingPoint {
                        date: w.date,
                        should: should_caregivers(w.suggested_caregivers.unwrap_or(0.0), params),
                        is: w.caregivers_total,
                    })
                    .collect();
                points.sort_by(|a, b| b.date.cmp(&a.date));
                points
            };

            ShouldVsIs {
                station_id: station.id,
                station_name: station.name.clone(),
                dataset_day: dataset(Shift::Day),
                dataset_night: dataset(Shift::Night),
            }
        })
        .collect()
}

/// Suggested caregivers scaled from shift units to weekly contract hours.
pub fn should_caregivers(suggested: f64, params: &StaffingParams) -> f64 {
    if params.shift_hours <= 0.0 {
        return 0.0;
    }
    round2(suggested * params.weekly_hours / params.shift_hours)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
