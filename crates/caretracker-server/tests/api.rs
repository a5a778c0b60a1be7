use std::io::Cursor;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use axum::response::IntoResponse;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use http_body_util::BodyExt;
use jiff::civil::{Date, date};
use rust_xlsxwriter::Workbook;
use serde_json::{Value, json};
use tower::ServiceExt;

use caretracker_core::models::patient::Patient;
use caretracker_core::models::question::{CareCategory, CareField, CareServiceOption};
use caretracker_core::models::station::Station;
use caretracker_core::models::stay::{PatientDayRecord, VisitType};
use caretracker_scoring::schemes::ppbv::Ppbv;
use caretracker_server::build_router;
use caretracker_server::config::ServerConfig;
use caretracker_server::error::ApiError;
use caretracker_server::state::{AppState, Clock};
use caretracker_storage::error::StorageError;
use caretracker_storage::store::{Snapshot, Store};

const TODAY: Date = date(2024, 5, 2);
const TOKEN: &str = "s3cr3t";

/// Option id of general care, area `category`, level `severity`.
fn a(category: i64, severity: i64) -> i64 {
    100 + category * 10 + severity
}

fn catalog() -> Vec<CareServiceOption> {
    let mut options = Vec::new();
    for (field_id, short, levels) in [(1, "A", 4), (2, "S", 3)] {
        for category in 1..=2 {
            for severity in 1..=levels {
                options.push(CareServiceOption {
                    id: field_id * 100 + category * 10 + i64::from(severity),
                    name: format!("{short}-{category}-{severity}-1"),
                    description: String::new(),
                    field: CareField {
                        id: field_id,
                        name: format!("Field {short}"),
                        short: short.to_string(),
                    },
                    category: CareCategory {
                        id: field_id * 10 + category,
                        name: format!("Area {category}"),
                    },
                    severity,
                    list_index: 1,
                });
            }
        }
    }
    options
}

fn app() -> Router {
    let snapshot = Snapshot {
        stations: vec![Station {
            id: 1,
            name: "Station A".to_string(),
            is_intensive_care: false,
            is_child_care_unit: false,
            bed_count: 20,
            max_patients_per_caregiver: 20.0,
        }],
        patients: vec![Patient {
            id: 1,
            first_name: "Erika".to_string(),
            last_name: "Muster".to_string(),
            date_of_birth: None,
            deceased_date: None,
        }],
        catalog: catalog(),
        day_records: vec![PatientDayRecord {
            patient_id: 1,
            station_id: 1,
            date: TODAY,
            visit_type: VisitType::FullyStationary,
            is_repeating_visit: false,
            uses_quarter_entry: false,
            admitted_at: date(2024, 4, 20).at(9, 0, 0, 0),
            discharged_at: date(2024, 6, 1).at(9, 0, 0, 0),
        }],
        ..Snapshot::default()
    };
    let config = ServerConfig {
        snapshot_path: None,
        ..ServerConfig::default()
    };
    let store = Store::new(snapshot, Arc::new(Ppbv::default()), config.staffing);
    let state = AppState::new(store, config).with_clock(Clock::Fixed(TODAY.at(14, 7, 0, 0)));
    build_router(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_csrf(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("sessionid=abc; csrftoken={TOKEN}"))
        .header("X-CSRFToken", TOKEN)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    with_csrf(method, uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, req).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn questions_uri() -> String {
    format!("/api/questions/1/1/{TODAY}")
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = send_json(&app(), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn station_listing_counts_todays_patients() {
    let app = app();
    let (status, body) = send_json(&app, get("/api/stations")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"id": 1, "name": "Station A", "patientCount": 1, "missing_classifications": 1}])
    );

    let (status, body) = send_json(&app, get("/api/stations/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Erika Muster");

    let (status, _) = send_json(&app, get("/api/stations/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutations_require_matching_csrf_token() {
    let app = app();
    let update = json!({"id": a(1, 3), "selected": true});

    let missing = Request::builder()
        .method(Method::PUT)
        .uri(questions_uri())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(update.to_string()))
        .unwrap();
    let (status, body) = send_json(&app, missing).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("CSRF"));

    let mismatched = Request::builder()
        .method(Method::PUT)
        .uri(questions_uri())
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, "csrftoken=one")
        .header("X-CSRFToken", "two")
        .body(Body::from(update.to_string()))
        .unwrap();
    let (status, _) = send_json(&app, mismatched).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Nothing was stored by the rejected requests.
    let (_, view) = send_json(&app, get(&questions_uri())).await;
    assert_eq!(view["version"], 0);
}

#[tokio::test]
async fn toggle_returns_refreshed_tree_and_result() {
    let app = app();
    let (status, view) = send_json(
        &app,
        json_request(Method::PUT, &questions_uri(), json!({"id": a(1, 3), "selected": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["version"], 1);
    assert_eq!(
        view["result"],
        json!({"category1": 2, "category2": 1, "minutes": 147})
    );
    assert_eq!(view["admission_date"], "2024-04-20");

    let (status, result) = send_json(&app, get(&format!("/api/calculate/1/1/{TODAY}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["minutes"], 147);

    let (status, last) = send_json(&app, get(&format!("/api/classification/1/1/{TODAY}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(last["a_index"], 2);
    assert_eq!(last["s_index"], 1);

    // Stale writers are told to reload.
    let (status, _) = send_json(
        &app,
        json_request(
            Method::PUT,
            &questions_uri(),
            json!({"id": a(2, 2), "selected": true, "expected_version": 0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_question_and_bad_dates_are_bad_requests() {
    let app = app();
    let (status, _) = send_json(
        &app,
        json_request(Method::PUT, &questions_uri(), json!({"id": 999, "selected": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(&app, get("/api/questions/1/1/02.05.2024")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("yyyy-mm-dd"));
}

#[tokio::test]
async fn calculate_without_classification_is_not_found() {
    let (status, _) = send_json(&app(), get(&format!("/api/calculate/1/1/{TODAY}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn direct_classification_validates_categories() {
    let app = app();
    let uri = |a: u8, s: u8| format!("/api/calculate_direct/1/1/{TODAY}/{a}/{s}");

    let (status, _) = send_json(&app, json_request(Method::POST, &uri(5, 1), Value::Null)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, result) = send_json(&app, json_request(Method::POST, &uri(2, 1), Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        result,
        json!({"category1": 2, "category2": 1, "minutes": 147})
    );

    let (status, body) = send_json(
        &app,
        get(&format!("/api/analysis/caregivers/1/{TODAY}/{TODAY}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["station_name"], "Station A");
}

#[tokio::test]
async fn direct_result_follows_isolation_toggle() {
    let app = app();
    let (status, result) = send_json(
        &app,
        json_request(Method::POST, &format!("/api/calculate_direct/1/1/{TODAY}/3/2"), Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["minutes"], 253);

    let (status, view) = send_json(
        &app,
        json_request(Method::PUT, &questions_uri(), json!({"is_in_isolation": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        view["result"],
        json!({"category1": 3, "category2": 2, "minutes": 343})
    );

    let (status, result) = send_json(&app, get(&format!("/api/calculate/1/1/{TODAY}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["minutes"], 343);
}

#[tokio::test]
async fn unsaved_change_is_reported_with_its_reason() {
    let response = ApiError::from(StorageError::NotPersisted {
        reason: "disk full".to_string(),
    })
    .into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "change applied but not persisted: disk full");
}

#[tokio::test]
async fn station_analysis_per_frequency() {
    let app = app();
    send_json(
        &app,
        json_request(Method::POST, &format!("/api/calculate_direct/1/1/{TODAY}/1/1"), Value::Null),
    )
    .await;

    let (status, daily) = send_json(&app, get("/api/stations/analysis?frequency=daily")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        daily,
        json!([
            {"id": 1, "name": "Station A", "minutes": 92},
            {"id": -1, "name": "Gesamt", "minutes": 92}
        ])
    );

    let (status, monthly) = send_json(&app, get("/api/stations/analysis?frequency=monthly")).await;
    assert_eq!(status, StatusCode::OK);
    let series = monthly.as_array().unwrap();
    assert_eq!(series.len(), 2);
    // 2024-04-02 ..= 2024-05-02
    assert_eq!(series[0]["data"].as_array().unwrap().len(), 31);
    assert_eq!(series[0]["sum"], 92);
    assert_eq!(series[1]["id"], -1);

    let (status, body) = send_json(&app, get("/api/stations/analysis?frequency=weekly")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("weekly"));
}

#[tokio::test]
async fn daily_export_is_an_xlsx_attachment() {
    let app = app();
    let req = json_request(
        Method::POST,
        "/api/export/daily",
        json!([{"id": 1, "name": "Station A", "minutes": 4241}]),
    );
    let (status, headers, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("02-05-2024-14%3A07_T%C3%A4gliche_Analyse.xlsx"));

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(body.to_vec())).unwrap();
    let range = workbook.worksheet_range_at(0).unwrap().unwrap();
    let last: Vec<Data> = range.rows().last().unwrap().to_vec();
    assert_eq!(last[1], Data::String("Gesamt".into()));
    assert_eq!(last[2], Data::Float(4241.0));
}

fn upload(content_type: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "caretracker-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"patienten.xlsx\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    with_csrf(Method::POST, &format!("/api/import/patient/{TODAY}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn patient_sheet() -> Vec<u8> {
    let header = [
        "Vorname",
        "Nachname",
        "Patienten-ID",
        "Stationsname",
        "Teilstationär",
        "Vollstationär",
        "Aufnahmetag",
        "Entlassungstag",
        "Wiederkehrend",
    ];
    let rows = [
        ["Max", "Beispiel", "3", "Station A", "Nein", "Ja", "2024-05-01 10:00", "", "Nein"],
        ["Eva", "Probe", "4", "Nirgendwo", "Nein", "Ja", "2024-05-01 10:00", "", "Nein"],
    ];

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, title) in (0u16..).zip(header) {
        sheet.write_string(0, col, title).unwrap();
    }
    for (r, row) in (1u32..).zip(rows) {
        for (col, value) in (0u16..).zip(row) {
            if col == 2 {
                sheet.write_number(r, col, value.parse::<f64>().unwrap()).unwrap();
            } else if !value.is_empty() {
                sheet.write_string(r, col, value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

#[tokio::test]
async fn import_rejects_non_spreadsheets_before_parsing() {
    let (status, body) = send_json(&app(), upload("text/csv", b"Vorname;Nachname\n")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        body["error"],
        "Bitte nur Excel-Dateien hochladen (.xls, .xlsx oder .ods)"
    );
}

#[tokio::test]
async fn import_creates_patients_and_reports_unknown_stations() {
    let app = app();
    let (status, body) = send_json(
        &app,
        upload(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            &patient_sheet(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"], 1);
    assert_eq!(body["created_patients"], 1);
    assert_eq!(body["errors"][0]["row"], 3);
    assert!(body["errors"][0]["message"].as_str().unwrap().contains("Nirgendwo"));

    let (_, stations) = send_json(&app, get("/api/stations")).await;
    assert_eq!(stations[0]["patientCount"], 2);

    let (status, station) = send_json(&app, get("/api/current-station/3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(station["name"], "Station A");
}

#[tokio::test]
async fn caregiver_import_feeds_the_staffing_chart() {
    let app = app();
    let (status, body) = send_json(
        &app,
        json_request(
            Method::POST,
            "/api/import/caregiver",
            json!([
                {"station_id": 1, "date": "2024-05-02", "shift": "DAY", "caregivers_total": 3.0},
                {"station_id": 1, "date": "2024-05-02", "shift": "NIGHT", "caregivers_total": 1.0}
            ]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"], 2);

    let (status, body) = send_json(&app, get("/api/analysis/caregivers/2024-05-01/2024-05-02")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["dataset_day"][0]["is"], 3.0);

    let (status, body) = send_json(
        &app,
        json_request(
            Method::POST,
            "/api/import/caregiver",
            json!([{"station_id": 9, "date": "2024-05-02", "shift": "DAY", "caregivers_total": 3.0}]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
