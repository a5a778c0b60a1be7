use serde::{Deserialize, Serialize};
use ts_rs::TS;

use caretracker_core::models::classification::AssessmentIndices;
use caretracker_core::models::question::{Category, Field};
use caretracker_core::models::stay::{PatientDayRecord, VisitType};

use crate::error::ScoringError;

/// Highest and lowest care group of either field.
pub const MIN_GROUP: u8 = 1;
pub const MAX_GROUP: u8 = 4;

/// Scoring-relevant level of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSeverity {
    pub category_id: i64,
    /// Highest selected level, or the lowest defined level if nothing is selected.
    pub level: u8,
    /// False when the category sits at its baseline.
    pub contributes: bool,
}

impl ActiveSeverity {
    pub fn of(category: &Category) -> Self {
        let selected = category
            .severities
            .iter()
            .filter(|s| s.has_selection())
            .map(|s| s.severity)
            .max();

        match selected {
            Some(level) => Self {
                category_id: category.id,
                level,
                contributes: true,
            },
            None => Self {
                category_id: category.id,
                level: category
                    .severities
                    .iter()
                    .map(|s| s.severity)
                    .min()
                    .unwrap_or(MIN_GROUP),
                contributes: false,
            },
        }
    }

    /// Active severities of every category in a field, in field order.
    pub fn of_field(field: &Field) -> Vec<Self> {
        field.categories.iter().map(Self::of).collect()
    }
}

/// Number of categories whose selections reach `level` or higher.
///
/// A selection at a higher level implies the lower levels of that category.
pub fn reaching(levels: &[ActiveSeverity], level: u8) -> usize {
    levels
        .iter()
        .filter(|l| l.contributes && l.level >= level)
        .count()
}

/// Facts about the patient's stay that change the minutes, but not the
/// category pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StayContext {
    pub is_in_isolation: bool,
    pub visit_type: VisitType,
    pub is_day_of_admission: bool,
    pub is_repeating_visit: bool,
    /// The quarterly surcharge for repeat visits was already granted.
    pub has_entry_for_current_quarter: bool,
}

impl StayContext {
    /// Build from the hospital's day record, if there is one.
    ///
    /// A day that itself carries the quarter entry is scored as if no entry
    /// existed yet, so recomputing that day keeps its surcharge.
    pub fn from_record(
        record: Option<&PatientDayRecord>,
        is_in_isolation: bool,
        has_entry_for_current_quarter: bool,
    ) -> Self {
        match record {
            Some(r) => Self {
                is_in_isolation,
                visit_type: r.visit_type,
                is_day_of_admission: r.is_day_of_admission(),
                is_repeating_visit: r.is_repeating_visit,
                has_entry_for_current_quarter: !r.uses_quarter_entry
                    && has_entry_for_current_quarter,
            },
            None => Self {
                is_in_isolation,
                ..Self::default()
            },
        }
    }
}

/// Everything besides the question tree that scoring reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringContext {
    pub indices: AssessmentIndices,
    pub stay: StayContext,
}

/// Care minutes per category pair plus the stay surcharges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MinutesTable {
    /// Base minutes added to every classified day.
    pub base: u32,
    /// Replaces `base` for patients in isolation.
    pub isolation_base: u32,
    /// Added once for admissions.
    pub admission_surcharge: u32,
    /// `grid[a - 1][s - 1]` holds the minutes of group `A{a}/S{s}`.
    pub grid: [[u32; 4]; 4],
}

impl Default for MinutesTable {
    fn default() -> Self {
        Self {
            base: 33,
            isolation_base: 123,
            admission_surcharge: 75,
            grid: [
                [59, 76, 112, 151],
                [114, 131, 167, 206],
                [203, 220, 256, 295],
                [335, 352, 388, 427],
            ],
        }
    }
}

impl MinutesTable {
    /// Minutes of a category pair, without base or surcharges.
    pub fn lookup(&self, category1: u8, category2: u8) -> Result<u32, ScoringError> {
        let a = group_index("general", category1)?;
        let s = group_index("specialized", category2)?;
        Ok(self.grid[a][s])
    }

    /// Total minutes for one patient-day.
    pub fn minutes(
        &self,
        category1: u8,
        category2: u8,
        stay: &StayContext,
    ) -> Result<u32, ScoringError> {
        let mut minutes = if stay.is_in_isolation {
            self.isolation_base
        } else {
            self.base
        };
        minutes += self.lookup(category1, category2)?;

        let semi_stationary = stay.visit_type == VisitType::SemiStationary;
        if semi_stationary {
            minutes /= 2;
        }
        if stay.visit_type == VisitType::FullyStationary && stay.is_day_of_admission {
            minutes += self.admission_surcharge;
        }
        if semi_stationary && !stay.is_repeating_visit {
            minutes += self.admission_surcharge;
        }
        // Repeat visits for the same illness get the surcharge once per quarter.
        if semi_stationary && stay.is_repeating_visit && !stay.has_entry_for_current_quarter {
            minutes += self.admission_surcharge;
        }

        Ok(minutes)
    }
}

fn group_index(field: &'static str, value: u8) -> Result<usize, ScoringError> {
    if (MIN_GROUP..=MAX_GROUP).contains(&value) {
        Ok(usize::from(value - MIN_GROUP))
    } else {
        Err(ScoringError::InvalidCategory { field, value })
    }
}
