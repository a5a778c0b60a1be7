use std::collections::HashMap;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use serde::Serialize;

use caretracker_core::models::patient::Patient;
use caretracker_export::import::{RowError, ensure_spreadsheet, read_patient_rows};
use caretracker_storage::store::CaregiverShift;

use super::path_date;
use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the spreadsheet.
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub created_patients: usize,
    pub errors: Vec<RowError>,
}

/// Patient day data for `date`, one spreadsheet row per patient.
///
/// The upload's content type is checked before any byte is parsed. Rows
/// naming an unknown station are skipped and reported with the malformed
/// ones.
pub async fn import_patients(
    State(state): State<AppState>,
    Path(date): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, ApiError> {
    let date = path_date(&date)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        ensure_spreadsheet(field.content_type())?;
        upload = Some(field.bytes().await?);
        break;
    }
    let bytes = upload.ok_or_else(|| ApiError::BadRequest(format!("missing '{UPLOAD_FIELD}' upload")))?;

    let report = read_patient_rows(&bytes)?;
    let stations: HashMap<String, i64> = state
        .store
        .roster()
        .await
        .into_iter()
        .map(|s| (s.name, s.id))
        .collect();

    let mut errors = report.errors;
    let mut rows = Vec::with_capacity(report.rows.len());
    for row in report.rows {
        let Some(&station_id) = stations.get(&row.station_name) else {
            errors.push(RowError {
                row: row.row,
                message: format!("unknown station '{}'", row.station_name),
            });
            continue;
        };
        let patient = Patient {
            id: row.patient_id,
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            date_of_birth: None,
            deceased_date: None,
        };
        rows.push((patient, row.to_record(station_id, date)));
    }
    errors.sort_by_key(|e| e.row);

    let imported = rows.len();
    let created_patients = state.store.import_day_records(rows).await?;
    tracing::info!(
        date = %date,
        imported,
        created_patients,
        rejected = errors.len(),
        "patient import stored"
    );

    Ok(Json(ImportSummary {
        imported,
        created_patients,
        errors,
    }))
}

#[derive(Debug, Serialize)]
pub struct CaregiverImportSummary {
    pub imported: usize,
}

/// Caregivers per station and shift, as reported by the hospital.
pub async fn import_caregivers(
    State(state): State<AppState>,
    Json(shifts): Json<Vec<CaregiverShift>>,
) -> Result<Json<CaregiverImportSummary>, ApiError> {
    state.store.import_caregivers(&shifts).await?;
    tracing::info!(shifts = shifts.len(), "caregiver import stored");
    Ok(Json(CaregiverImportSummary {
        imported: shifts.len(),
    }))
}
