use std::collections::BTreeSet;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

use super::question::Field;

/// Identifies one patient-day classification on one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassificationKey {
    pub station_id: i64,
    pub patient_id: i64,
    pub date: Date,
}

/// Category pair and care minutes derived for one patient-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClassificationResult {
    /// General care group (A1..A4).
    pub category1: u8,
    /// Specialized care group (S1..S4).
    pub category2: u8,
    pub minutes: u32,
}

impl ClassificationResult {
    /// Code such as `A2/S3`.
    pub fn code(&self) -> String {
        format!("A{}/S{}", self.category1, self.category2)
    }
}

/// Standardized assessments the hospital records for a patient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssessmentIndices {
    #[serde(default)]
    pub barthel_index: Option<u8>,
    #[serde(default)]
    pub expanded_barthel_index: Option<u8>,
    #[serde(default)]
    pub mini_mental_status: Option<u8>,
}

/// Stored state of a daily classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyClassification {
    pub key: ClassificationKey,
    #[serde(default)]
    pub is_in_isolation: bool,
    /// Ids of the selected care service options.
    #[serde(default)]
    pub selected: BTreeSet<i64>,
    #[serde(default)]
    pub indices: AssessmentIndices,
    #[serde(default)]
    pub result: Option<ClassificationResult>,
    /// Category pair entered without questions. It takes precedence over
    /// the selections until a question is toggled again.
    #[serde(default)]
    pub direct: Option<(u8, u8)>,
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub bed_number: Option<String>,
    /// Bumped on every accepted mutation.
    #[serde(default)]
    pub version: u64,
}

impl DailyClassification {
    pub fn new(key: ClassificationKey) -> Self {
        Self {
            key,
            is_in_isolation: false,
            selected: BTreeSet::new(),
            indices: AssessmentIndices::default(),
            result: None,
            direct: None,
            room_name: None,
            bed_number: None,
            version: 0,
        }
    }

    /// Apply a partial update. `known` tells whether an option id exists in
    /// the catalog; unknown ids are rejected without touching the state.
    pub fn apply(
        &mut self,
        update: &ClassificationUpdate,
        known: impl Fn(i64) -> bool,
    ) -> Result<(), CoreError> {
        if update.selection().is_none() && update.is_in_isolation.is_none() {
            return Err(CoreError::EmptyUpdate);
        }
        if let Some((id, _)) = update.selection()
            && !known(id)
        {
            return Err(CoreError::UnknownQuestion(id));
        }

        if let Some((id, selected)) = update.selection() {
            self.direct = None;
            if selected {
                self.selected.insert(id);
            } else {
                self.selected.remove(&id);
            }
        }
        if let Some(isolation) = update.is_in_isolation {
            self.is_in_isolation = isolation;
        }
        self.version += 1;
        Ok(())
    }
}

/// Partial update of a classification: a question toggle, an isolation
/// flag, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClassificationUpdate {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub selected: Option<bool>,
    #[serde(default)]
    pub is_in_isolation: Option<bool>,
    /// Rejects the update if the stored version moved on.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl ClassificationUpdate {
    pub fn select(id: i64, selected: bool) -> Self {
        Self {
            id: Some(id),
            selected: Some(selected),
            ..Self::default()
        }
    }

    pub fn isolation(is_in_isolation: bool) -> Self {
        Self {
            is_in_isolation: Some(is_in_isolation),
            ..Self::default()
        }
    }

    fn selection(&self) -> Option<(i64, bool)> {
        Some((self.id?, self.selected?))
    }
}

/// A classification as shown to staff: the question tree with selections
/// applied, plus the patient's stay information.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClassificationView {
    pub care_service_options: Vec<Field>,
    pub is_in_isolation: bool,
    pub admission_date: Option<Date>,
    pub discharge_date: Option<Date>,
    #[serde(flatten)]
    pub indices: AssessmentIndices,
    pub result: Option<ClassificationResult>,
    pub version: u64,
}
