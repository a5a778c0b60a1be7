//! caretracker-server
//!
//! HTTP API of CareTracker: station and patient listings, the classification
//! question tree, analyses, and the Excel import/export. All routes live
//! under `/api`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(routes::health::health_check))
        // Stations and patients
        .route("/stations", get(routes::stations::list_stations))
        .route("/stations/analysis", get(routes::stations::station_analysis))
        .route("/stations/{station_id}", get(routes::stations::station_patients))
        .route("/visit-type/{station_id}", get(routes::stations::visit_types))
        .route(
            "/current-station/{patient_id}",
            get(routes::stations::current_station),
        )
        .route(
            "/patient/dates/{patient_id}/{station_id}",
            get(routes::stations::patient_dates),
        )
        // Classification
        .route(
            "/classification/{station_id}/{patient_id}/{date}",
            get(routes::classification::get_classification),
        )
        .route(
            "/questions/{station_id}/{patient_id}/{date}",
            get(routes::classification::get_questions).put(routes::classification::update_questions),
        )
        .route(
            "/calculate/{station_id}/{patient_id}/{date}",
            get(routes::classification::calculate),
        )
        .route(
            "/calculate_direct/{station_id}/{patient_id}/{date}/{category1}/{category2}",
            post(routes::classification::calculate_direct),
        )
        // Analysis
        .route(
            "/analysis/caregivers/{start}/{end}",
            get(routes::analysis::caregivers),
        )
        .route(
            "/analysis/caregivers/{station_id}/{start}/{end}",
            get(routes::analysis::station_caregivers),
        )
        .route(
            "/analysis/workload/{month}",
            get(routes::analysis::monthly_workload),
        )
        // Excel
        .route("/export/daily", post(routes::export::export_daily_analysis))
        .route("/export/monthly", post(routes::export::export_monthly_analysis))
        .route("/import/patient/{date}", post(routes::import::import_patients))
        .route("/import/caregiver", post(routes::import::import_caregivers))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::csrf::require_csrf,
        ));

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(axum_mw::from_fn(middleware::audit::audit_log)),
        )
        .with_state(state)
}
