//! caretracker-scoring
//!
//! Care classification scoring. Pure logic, no I/O. Walks a patient-day's
//! question tree, derives the general and specialized care groups, and
//! looks up the care minutes.

pub mod error;
pub mod rules;
pub mod schemes;
pub mod scoring;
pub mod tree;

use caretracker_core::models::classification::ClassificationResult;
use caretracker_core::models::question::Field;

use error::ScoringError;
use rules::FieldRule;
use scoring::{ActiveSeverity, MAX_GROUP, MIN_GROUP, MinutesTable, ScoringContext};

/// A classification scheme: which fields feed the category pair, how a
/// field's levels combine, and how many minutes a pair is worth.
pub trait CareScheme: Send + Sync {
    /// Unique identifier (e.g., "ppbv").
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Short code of the field producing `category1`.
    fn general_field(&self) -> &str {
        "A"
    }

    /// Short code of the field producing `category2`.
    fn special_field(&self) -> &str {
        "S"
    }

    fn general_rule(&self) -> &dyn FieldRule;

    fn special_rule(&self) -> &dyn FieldRule;

    fn minutes_table(&self) -> &MinutesTable;

    /// Care group of the field with the given short code. A field absent
    /// from the tree scores as baseline.
    fn field_group(
        &self,
        fields: &[Field],
        short: &str,
        rule: &dyn FieldRule,
        context: &ScoringContext,
    ) -> u8 {
        fields
            .iter()
            .find(|f| f.short == short)
            .map_or(MIN_GROUP, |f| {
                rule.group(&ActiveSeverity::of_field(f), &context.indices)
                    .clamp(MIN_GROUP, MAX_GROUP)
            })
    }

    /// Score a patient-day. Returns `None` while no question is selected:
    /// the day is unclassified, not classified as zero.
    fn score(&self, fields: &[Field], context: &ScoringContext) -> Option<ClassificationResult> {
        if !fields.iter().flat_map(Field::questions).any(|q| q.selected) {
            return None;
        }

        let category1 = self.field_group(fields, self.general_field(), self.general_rule(), context);
        let category2 = self.field_group(fields, self.special_field(), self.special_rule(), context);
        let minutes = self
            .minutes_table()
            .minutes(category1, category2, &context.stay)
            .ok()?;

        Some(ClassificationResult {
            category1,
            category2,
            minutes,
        })
    }

    /// Classify directly from an explicit category pair, skipping the
    /// questions.
    fn score_direct(
        &self,
        category1: u8,
        category2: u8,
        context: &ScoringContext,
    ) -> Result<ClassificationResult, ScoringError> {
        let minutes = self
            .minutes_table()
            .minutes(category1, category2, &context.stay)?;
        Ok(ClassificationResult {
            category1,
            category2,
            minutes,
        })
    }
}

/// Return all registered schemes, with their default parameters.
pub fn all_schemes() -> Vec<Box<dyn CareScheme>> {
    vec![Box::new(schemes::ppbv::Ppbv::default())]
}

/// Look up a scheme by ID.
pub fn get_scheme(id: &str) -> Option<Box<dyn CareScheme>> {
    all_schemes().into_iter().find(|s| s.id() == id)
}
