use axum::Json;
use axum::extract::{Path, Query, State};
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use caretracker_analysis::aggregate::{StationMinutes, StationSeries, daily_with_total, series_with_total};
use caretracker_core::dates::ViewMode;
use caretracker_core::models::patient::PatientSummary;
use caretracker_core::models::station::{Station, StationSummary};
use caretracker_storage::store::VisitTypeGroups;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_stations(State(state): State<AppState>) -> Json<Vec<StationSummary>> {
    Json(state.store.stations(state.today()).await)
}

/// Patients on the station today.
pub async fn station_patients(
    State(state): State<AppState>,
    Path(station_id): Path<i64>,
) -> Result<Json<Vec<PatientSummary>>, ApiError> {
    let patients = state.store.patients(station_id, state.today()).await?;
    Ok(Json(patients))
}

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    #[serde(default)]
    pub frequency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StationAnalysis {
    Daily(Vec<StationMinutes>),
    Series(Vec<StationSeries>),
}

/// Care minutes of every station, plus the combined entry, for today or the
/// month/quarter ending today.
pub async fn station_analysis(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<StationAnalysis>, ApiError> {
    let mode = match query.frequency.as_deref() {
        None | Some("") => ViewMode::Daily,
        Some(frequency) => frequency.parse::<ViewMode>()?,
    };
    let today = state.today();
    let roster = state.store.roster().await;
    let scored = state.store.scored_days().await;

    let analysis = match mode {
        ViewMode::Daily => StationAnalysis::Daily(daily_with_total(&roster, &scored, today)),
        ViewMode::Monthly | ViewMode::Quarterly => StationAnalysis::Series(series_with_total(
            &roster,
            &scored,
            mode.range_start(today),
            today,
        )),
    };
    tracing::debug!(frequency = %mode, stations = roster.len(), "station analysis");
    Ok(Json(analysis))
}

/// Today's patients of a station, grouped by how long they stay.
pub async fn visit_types(
    State(state): State<AppState>,
    Path(station_id): Path<i64>,
) -> Result<Json<VisitTypeGroups>, ApiError> {
    Ok(Json(state.store.visit_types(station_id, state.today()).await?))
}

pub async fn current_station(
    State(state): State<AppState>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Station>, ApiError> {
    Ok(Json(state.store.current_station(patient_id, state.today()).await?))
}

pub async fn patient_dates(
    State(state): State<AppState>,
    Path((patient_id, station_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<Date>>, ApiError> {
    Ok(Json(state.store.patient_dates(patient_id, station_id).await?))
}
