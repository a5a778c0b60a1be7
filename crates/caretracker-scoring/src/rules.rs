//! Rules combining a field's category levels into one care group.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use caretracker_core::models::classification::AssessmentIndices;

use crate::scoring::{ActiveSeverity, MIN_GROUP, reaching};

/// Combines the active severities of one field into a care group (1..=4).
pub trait FieldRule: Send + Sync {
    fn group(&self, levels: &[ActiveSeverity], indices: &AssessmentIndices) -> u8;
}

/// Thresholds at or below which an assessment allows the highest general
/// care group. A missing assessment never opens the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssessmentGate {
    pub barthel_max: u8,
    pub expanded_barthel_max: u8,
    pub mini_mental_max: u8,
}

impl Default for AssessmentGate {
    fn default() -> Self {
        Self {
            barthel_max: 35,
            expanded_barthel_max: 15,
            mini_mental_max: 16,
        }
    }
}

impl AssessmentGate {
    pub fn is_open(&self, indices: &AssessmentIndices) -> bool {
        let within = |value: Option<u8>, max: u8| value.is_some_and(|v| v <= max);
        within(indices.barthel_index, self.barthel_max)
            || within(indices.expanded_barthel_index, self.expanded_barthel_max)
            || within(indices.mini_mental_status, self.mini_mental_max)
    }
}

/// General care (A1..A4).
///
/// - A4: at least two areas reach level 4 and the assessment gate is open
/// - A3: at least two areas reach level 3
/// - A2: at least two areas reach level 2, or one area reaches level 3
/// - A1: otherwise
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GeneralCareRule {
    #[serde(default)]
    pub gate: AssessmentGate,
}

impl FieldRule for GeneralCareRule {
    fn group(&self, levels: &[ActiveSeverity], indices: &AssessmentIndices) -> u8 {
        if reaching(levels, 4) >= 2 && self.gate.is_open(indices) {
            4
        } else if reaching(levels, 3) >= 2 {
            3
        } else if reaching(levels, 2) >= 2 || reaching(levels, 3) >= 1 {
            2
        } else {
            MIN_GROUP
        }
    }
}

/// Specialized care (S1..S4). Questions only go up to level 3; S4 means
/// level 3 in at least two areas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecialCareRule;

impl FieldRule for SpecialCareRule {
    fn group(&self, levels: &[ActiveSeverity], _indices: &AssessmentIndices) -> u8 {
        match (reaching(levels, 3), reaching(levels, 2)) {
            (n, _) if n >= 2 => 4,
            (1, _) => 3,
            (_, n) if n >= 1 => 2,
            _ => MIN_GROUP,
        }
    }
}
