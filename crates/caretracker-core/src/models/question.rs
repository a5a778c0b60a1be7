use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Top-level field of care services, abbreviated e.g. `A` or `S`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CareField {
    pub id: i64,
    pub name: String,
    pub short: String,
}

/// Area of care within a field, e.g. hygiene or nutrition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CareCategory {
    pub id: i64,
    pub name: String,
}

/// One entry of the question catalog, as the institution defines it.
///
/// Each option sits at exactly one (field, category, severity) coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CareServiceOption {
    pub id: i64,
    /// Concatenated coordinate, e.g. `A-koerperpflege-1-1`.
    pub name: String,
    pub description: String,
    pub field: CareField,
    pub category: CareCategory,
    /// Degree of needed help, increasing from 1.
    pub severity: u8,
    /// Position within its (field, category, severity) group.
    #[serde(default)]
    pub list_index: u32,
}

/// A selectable question as shown in a classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Question {
    pub id: i64,
    pub name: String,
    pub short: String,
    pub description: String,
    pub severity: u8,
    #[serde(default)]
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SeverityLevel {
    pub severity: u8,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl SeverityLevel {
    pub fn has_selection(&self) -> bool {
        self.questions.iter().any(|q| q.selected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Sorted ascending by severity.
    #[serde(default)]
    pub severities: Vec<SeverityLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Field {
    pub id: i64,
    pub name: String,
    pub short: String,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Field {
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.categories
            .iter()
            .flat_map(|c| &c.severities)
            .flat_map(|s| &s.questions)
    }
}
