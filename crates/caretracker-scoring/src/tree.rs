use std::collections::{BTreeSet, HashMap};

use caretracker_core::models::question::{
    CareServiceOption, Category, Field, Question, SeverityLevel,
};

/// Group the flat option catalog into field → category → severity.
///
/// Fields and categories keep the order in which the catalog first names
/// them; severity levels are sorted ascending, questions by `list_index`.
/// An option is selected when its id is in `selected`.
pub fn group_questions(catalog: &[CareServiceOption], selected: &BTreeSet<i64>) -> Vec<Field> {
    let mut fields: Vec<Field> = Vec::new();

    for option in catalog {
        let fi = position_or_push(&mut fields, |f| f.id == option.field.id, || Field {
            id: option.field.id,
            name: option.field.name.clone(),
            short: option.field.short.clone(),
            categories: Vec::new(),
        });
        let categories = &mut fields[fi].categories;

        let ci = position_or_push(categories, |c| c.id == option.category.id, || Category {
            id: option.category.id,
            name: option.category.name.clone(),
            severities: Vec::new(),
        });
        let severities = &mut categories[ci].severities;

        let si = position_or_push(severities, |s| s.severity == option.severity, || {
            SeverityLevel {
                severity: option.severity,
                questions: Vec::new(),
            }
        });

        severities[si].questions.push(Question {
            id: option.id,
            name: option.name.clone(),
            short: format!("{}{}", option.field.short, option.severity),
            description: option.description.clone(),
            severity: option.severity,
            selected: selected.contains(&option.id),
        });
    }

    let list_index: HashMap<i64, u32> = catalog.iter().map(|o| (o.id, o.list_index)).collect();
    for category in fields.iter_mut().flat_map(|f| &mut f.categories) {
        category.severities.sort_by_key(|s| s.severity);
        for level in &mut category.severities {
            level
                .questions
                .sort_by_key(|q| list_index.get(&q.id).copied().unwrap_or(u32::MAX));
        }
    }

    fields
}

fn position_or_push<T>(
    items: &mut Vec<T>,
    matches: impl Fn(&T) -> bool,
    make: impl FnOnce() -> T,
) -> usize {
    match items.iter().position(matches) {
        Some(i) => i,
        None => {
            items.push(make());
            items.len() - 1
        }
    }
}
