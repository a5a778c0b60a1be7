use jiff::civil::{Date, DateTime, Time};
use jiff::{SignedDuration, ToSpan};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

const DAY_SHIFT_START: Time = Time::constant(6, 0, 0, 0);
const NIGHT_SHIFT_START: Time = Time::constant(22, 0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum VisitType {
    #[default]
    #[serde(rename = "stationär")]
    FullyStationary,
    #[serde(rename = "teilstationär")]
    SemiStationary,
    #[serde(rename = "ambulant")]
    Ambulatory,
    #[serde(rename = "wiederkehrend")]
    Recurring,
}

/// The hospital's record of one patient on one station for one day.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatientDayRecord {
    pub patient_id: i64,
    pub station_id: i64,
    pub date: Date,
    #[serde(default)]
    pub visit_type: VisitType,
    /// Repeat visit for the same illness.
    #[serde(default)]
    pub is_repeating_visit: bool,
    /// The quarterly admission surcharge was already granted on this day.
    #[serde(default)]
    pub uses_quarter_entry: bool,
    pub admitted_at: DateTime,
    pub discharged_at: DateTime,
}

impl PatientDayRecord {
    pub fn is_day_of_admission(&self) -> bool {
        self.admitted_at.date() == self.date
    }

    pub fn is_day_of_discharge(&self) -> bool {
        self.discharged_at.date() == self.date
    }

    /// Whether the stay overlaps the night shift starting on `date`
    /// (22:00 until 06:00 the next morning).
    pub fn night_stay(&self) -> bool {
        let start = self.date.to_datetime(NIGHT_SHIFT_START);
        let end = self
            .date
            .saturating_add(1.day())
            .to_datetime(DAY_SHIFT_START);
        overlaps(self.admitted_at, self.discharged_at, start, end)
    }

    /// Whether the stay overlaps the day shift of `date` (06:00 to 22:00).
    pub fn day_stay(&self) -> bool {
        let start = self.date.to_datetime(DAY_SHIFT_START);
        let end = self.date.to_datetime(NIGHT_SHIFT_START);
        overlaps(self.admitted_at, self.discharged_at, start, end)
    }
}

/// How long a patient stays, as grouped in the station's visit-type listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StayClass {
    /// 24 hours or more.
    Stationary,
    /// More than 6 hours, less than 24.
    PartStationary,
    /// At most 6 hours.
    Acute,
    /// Discharged before admission.
    Undefined,
}

impl PatientDayRecord {
    pub fn stay_class(&self) -> StayClass {
        let stay = self.discharged_at.duration_since(self.admitted_at);
        let six_hours = SignedDuration::from_hours(6);
        let day = SignedDuration::from_hours(24);

        if stay.is_negative() {
            StayClass::Undefined
        } else if stay <= six_hours {
            StayClass::Acute
        } else if stay < day {
            StayClass::PartStationary
        } else {
            StayClass::Stationary
        }
    }
}

fn overlaps(from: DateTime, to: DateTime, start: DateTime, end: DateTime) -> bool {
    from < end && to > start
}
