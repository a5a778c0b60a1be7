use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};

use caretracker_analysis::aggregate::{StationMinutes, StationSeries};
use caretracker_export::xlsx::{ExportKind, export_daily, export_filename, export_monthly};

use crate::error::ApiError;
use crate::state::AppState;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Daily analysis as posted by the client, one row per station.
pub async fn export_daily_analysis(
    State(state): State<AppState>,
    Json(stations): Json<Vec<StationMinutes>>,
) -> Result<Response, ApiError> {
    let bytes = export_daily(&stations, &state.config.sheet)?;
    let filename = export_filename(ExportKind::Daily, state.clock.now());
    tracing::info!(stations = stations.len(), filename = %filename, "daily analysis exported");
    attachment(bytes, &filename)
}

pub async fn export_monthly_analysis(
    State(state): State<AppState>,
    Json(series): Json<Vec<StationSeries>>,
) -> Result<Response, ApiError> {
    let bytes = export_monthly(&series, &state.config.sheet)?;
    let filename = export_filename(ExportKind::Monthly, state.clock.now());
    tracing::info!(stations = series.len(), filename = %filename, "monthly analysis exported");
    attachment(bytes, &filename)
}

fn attachment(bytes: Vec<u8>, filename: &str) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&content_disposition(filename))
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// `attachment` with an ASCII fallback name and the exact UTF-8 name
/// (RFC 6266 / RFC 5987), since export names carry umlauts.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            'ä' => "ae".to_string(),
            'ö' => "oe".to_string(),
            'ü' => "ue".to_string(),
            '"' | '\\' => "_".to_string(),
            c if c.is_ascii() && !c.is_ascii_control() => c.to_string(),
            _ => "_".to_string(),
        })
        .collect();

    let mut encoded = String::with_capacity(filename.len() * 3);
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
