use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<Date>,
    #[serde(default)]
    pub deceased_date: Option<Date>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Most recent classification result of a patient on a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LastClassification {
    pub date: Date,
    pub a_index: u8,
    pub s_index: u8,
    pub minutes: u32,
}

/// Patient row of a station's patient listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PatientSummary {
    pub id: i64,
    pub name: String,
    pub current_room: Option<String>,
    pub current_bed: Option<String>,
    pub last_classification: Option<LastClassification>,
    #[serde(rename = "missing_classifications_last_week", default)]
    pub missing_classifications_last_week: Vec<Date>,
}
