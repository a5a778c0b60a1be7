use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::CareScheme;
use crate::rules::{FieldRule, GeneralCareRule, SpecialCareRule};
use crate::scoring::MinutesTable;

/// PPBV: Pflegepersonalbemessungsverordnung, the German regulation for
/// nurse staffing on adult normal wards.
/// General care A1–A4 × specialized care S1–S4, minutes per day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Ppbv {
    #[serde(default)]
    pub minutes: MinutesTable,
    #[serde(default)]
    pub general: GeneralCareRule,
    #[serde(skip)]
    pub special: SpecialCareRule,
}

impl CareScheme for Ppbv {
    fn id(&self) -> &str {
        "ppbv"
    }

    fn name(&self) -> &str {
        "PPBV"
    }

    fn general_rule(&self) -> &dyn FieldRule {
        &self.general
    }

    fn special_rule(&self) -> &dyn FieldRule {
        &self.special
    }

    fn minutes_table(&self) -> &MinutesTable {
        &self.minutes
    }
}
