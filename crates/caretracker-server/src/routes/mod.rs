pub mod analysis;
pub mod classification;
pub mod export;
pub mod health;
pub mod import;
pub mod stations;

use jiff::civil::Date;

use caretracker_core::dates::{DateFormat, parse_date};
use caretracker_core::models::classification::ClassificationKey;

use crate::error::ApiError;

/// Path dates are `yyyy-mm-dd`.
fn path_date(input: &str) -> Result<Date, ApiError> {
    Ok(parse_date(input, DateFormat::Backend)?)
}

fn classification_key(station_id: i64, patient_id: i64, date: &str) -> Result<ClassificationKey, ApiError> {
    Ok(ClassificationKey {
        station_id,
        patient_id,
        date: path_date(date)?,
    })
}
