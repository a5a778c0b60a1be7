use jiff::civil::{DateTime, date};
use rust_xlsxwriter::Workbook;

use caretracker_core::models::stay::VisitType;
use caretracker_export::error::ExportError;
use caretracker_export::import::{ensure_spreadsheet, read_patient_rows};

const HEADER: [&str; 9] = [
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

fn workbook(header: &[&str], rows: &[[&str; 9]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, title) in (0u16..).zip(header) {
        sheet.write_string(0, col, *title).unwrap();
    }
    for (r, row) in (1u32..).zip(rows) {
        for (col, value) in (0u16..).zip(row) {
            if col == 2 {
                sheet.write_number(r, col, value.parse::<f64>().unwrap()).unwrap();
            } else if !value.is_empty() {
                sheet.write_string(r, col, *value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

#[test]
fn accepts_only_spreadsheet_content_types() {
    assert!(ensure_spreadsheet(Some("application/vnd.ms-excel")).is_ok());
    assert!(ensure_spreadsheet(Some(
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    ))
    .is_ok());
    assert!(ensure_spreadsheet(Some("application/vnd.oasis.opendocument.spreadsheet; charset=binary")).is_ok());

    let err = ensure_spreadsheet(Some("text/csv")).unwrap_err();
    assert!(matches!(err, ExportError::UnsupportedFileType(_)));
    assert_eq!(
        err.to_string(),
        "Bitte nur Excel-Dateien hochladen (.xls, .xlsx oder .ods)"
    );
    assert!(ensure_spreadsheet(None).is_err());
}

#[test]
fn reads_patient_rows() {
    let bytes = workbook(
        &HEADER,
        &[
            [
                "Erika", "Muster", "17", "Station A", "Nein", "Ja",
                "2024-05-02 07:30", "", "Nein",
            ],
            [
                "Max", "Beispiel", "18", "Station B", "Ja", "Nein",
                "02.05.2024 08:00", "02.05.2024 16:00", "Ja",
            ],
        ],
    );

    let report = read_patient_rows(&bytes).unwrap();
    assert!(report.errors.is_empty());
    assert_eq!(report.rows.len(), 2);

    let erika = &report.rows[0];
    assert_eq!(erika.patient_id, 17);
    assert_eq!(erika.station_name, "Station A");
    assert_eq!(erika.visit_type, VisitType::FullyStationary);
    assert_eq!(erika.admitted_at, date(2024, 5, 2).at(7, 30, 0, 0));
    assert_eq!(erika.discharged_at, None);
    assert!(!erika.is_repeating_visit);

    let max = &report.rows[1];
    assert_eq!(max.visit_type, VisitType::SemiStationary);
    assert!(max.is_repeating_visit);
    assert_eq!(max.discharged_at, Some(date(2024, 5, 2).at(16, 0, 0, 0)));

    let record = erika.to_record(3, date(2024, 5, 2));
    assert_eq!(record.station_id, 3);
    assert!(record.is_day_of_admission());
    assert_eq!(record.discharged_at, DateTime::MAX);
}

#[test]
fn reads_serial_dates() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, title) in (0u16..).zip(HEADER) {
        sheet.write_string(0, col, title).unwrap();
    }
    sheet.write_string(1, 0, "Erika").unwrap();
    sheet.write_string(1, 1, "Muster").unwrap();
    sheet.write_number(1, 2, 17.0).unwrap();
    sheet.write_string(1, 3, "Station A").unwrap();
    // 2024-05-02 06:00
    sheet.write_number(1, 6, 45414.25).unwrap();

    let report = read_patient_rows(&workbook.save_to_buffer().unwrap()).unwrap();
    assert_eq!(report.rows[0].admitted_at, date(2024, 5, 2).at(6, 0, 0, 0));
    assert_eq!(report.rows[0].visit_type, VisitType::Ambulatory);
}

#[test]
fn malformed_rows_are_reported_and_skipped() {
    let bytes = workbook(
        &HEADER,
        &[
            ["A", "B", "1", "", "Nein", "Ja", "2024-05-02 07:30", "", "Nein"],
            ["C", "D", "2", "Station A", "Nein", "Ja", "gestern", "", "Nein"],
            ["E", "F", "3", "Station A", "Nein", "Ja", "2024-05-02 07:30", "", "Nein"],
        ],
    );

    let report = read_patient_rows(&bytes).unwrap();
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].patient_id, 3);
    let failed: Vec<usize> = report.errors.iter().map(|e| e.row).collect();
    assert_eq!(failed, vec![2, 3]);
}

#[test]
fn missing_column_fails_import() {
    let bytes = workbook(&HEADER[..8], &[]);
    let err = read_patient_rows(&bytes).unwrap_err();
    assert!(matches!(err, ExportError::MissingColumn("Wiederkehrend")));
}

#[test]
fn garbage_bytes_are_rejected() {
    assert!(read_patient_rows(b"not a spreadsheet").is_err());
}
