use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Station {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub is_intensive_care: bool,
    #[serde(default)]
    pub is_child_care_unit: bool,
    #[serde(default)]
    pub bed_count: u32,
    /// Allowed ratio of patients per caregiver on the night shift.
    #[serde(default = "default_patients_per_caregiver")]
    pub max_patients_per_caregiver: f64,
}

fn default_patients_per_caregiver() -> f64 {
    20.0
}

/// Station row of the station listing, computed for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StationSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "patientCount")]
    pub patient_count: u32,
    pub missing_classifications: u32,
}
