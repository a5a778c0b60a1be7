use axum::Json;
use axum::extract::{Path, State};

use caretracker_core::models::classification::{
    ClassificationResult, ClassificationUpdate, ClassificationView,
};
use caretracker_core::models::patient::LastClassification;

use super::classification_key;
use crate::error::ApiError;
use crate::state::AppState;

type KeyPath = Path<(i64, i64, String)>;

/// Stored result of a patient-day; 404 while it is unclassified.
pub async fn get_classification(
    State(state): State<AppState>,
    Path((station_id, patient_id, date)): KeyPath,
) -> Result<Json<LastClassification>, ApiError> {
    let key = classification_key(station_id, patient_id, &date)?;
    Ok(Json(state.store.classification_result(&key).await?))
}

pub async fn get_questions(
    State(state): State<AppState>,
    Path((station_id, patient_id, date)): KeyPath,
) -> Result<Json<ClassificationView>, ApiError> {
    let key = classification_key(station_id, patient_id, &date)?;
    Ok(Json(state.store.classification(&key).await?))
}

/// Toggle one question or the isolation flag. Answers with the whole tree as
/// stored after the change, so the client never merges state itself.
pub async fn update_questions(
    State(state): State<AppState>,
    Path((station_id, patient_id, date)): KeyPath,
    Json(update): Json<ClassificationUpdate>,
) -> Result<Json<ClassificationView>, ApiError> {
    let key = classification_key(station_id, patient_id, &date)?;
    Ok(Json(state.store.update_classification(&key, &update).await?))
}

pub async fn calculate(
    State(state): State<AppState>,
    Path((station_id, patient_id, date)): KeyPath,
) -> Result<Json<ClassificationResult>, ApiError> {
    let key = classification_key(station_id, patient_id, &date)?;
    Ok(Json(state.store.calculate(&key).await?))
}

pub async fn calculate_direct(
    State(state): State<AppState>,
    Path((station_id, patient_id, date, category1, category2)): Path<(i64, i64, String, u8, u8)>,
) -> Result<Json<ClassificationResult>, ApiError> {
    let key = classification_key(station_id, patient_id, &date)?;
    let result = state
        .store
        .classify_direct(&key, category1, category2)
        .await?;
    Ok(Json(result))
}
