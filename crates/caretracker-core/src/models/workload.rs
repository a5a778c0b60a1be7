use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Shift {
    Day,
    Night,
}

/// Caregiver workload of one station for one shift of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StationWorkload {
    pub station_id: i64,
    pub date: Date,
    pub shift: Shift,
    #[serde(default)]
    pub patients_total: u32,
    #[serde(default)]
    pub caregivers_total: f64,
    #[serde(default)]
    pub minutes_total: u32,
    /// Caregivers suggested by the regulation, once computed.
    #[serde(default)]
    pub suggested_caregivers: Option<f64>,
}

/// Monthly averages of one station and shift, keyed by the month's first day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyWorkload {
    pub station_id: i64,
    pub month: Date,
    pub shift: Shift,
    pub patients_avg: f64,
    pub actual_caregivers_avg: f64,
    pub suggested_caregivers_avg: f64,
    pub minutes_total: u32,
    pub shifts_per_caregiver: f64,
}
