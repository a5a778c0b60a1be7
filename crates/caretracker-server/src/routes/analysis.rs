use axum::Json;
use axum::extract::{Path, State};

use caretracker_analysis::workload::ShouldVsIs;
use caretracker_core::models::workload::MonthlyWorkload;

use super::path_date;
use crate::error::ApiError;
use crate::state::AppState;

/// Suggested versus actual caregivers of every station over `start..=end`.
pub async fn caregivers(
    State(state): State<AppState>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<Vec<ShouldVsIs>>, ApiError> {
    let (start, end) = (path_date(&start)?, path_date(&end)?);
    Ok(Json(state.store.should_vs_is(None, start, end).await?))
}

pub async fn station_caregivers(
    State(state): State<AppState>,
    Path((station_id, start, end)): Path<(i64, String, String)>,
) -> Result<Json<Vec<ShouldVsIs>>, ApiError> {
    let (start, end) = (path_date(&start)?, path_date(&end)?);
    Ok(Json(state.store.should_vs_is(Some(station_id), start, end).await?))
}

/// Day and night averages for the month containing `month`.
pub async fn monthly_workload(
    State(state): State<AppState>,
    Path(month): Path<String>,
) -> Result<Json<Vec<MonthlyWorkload>>, ApiError> {
    let month = path_date(&month)?;
    Ok(Json(state.store.monthly_workloads(month).await))
}
