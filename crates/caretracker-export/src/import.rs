//! Patient day data uploaded as a spreadsheet, one row per patient.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use jiff::ToSpan;
use serde::Serialize;
use jiff::civil::{Date, DateTime, date};

use caretracker_core::models::stay::{PatientDayRecord, VisitType};

use crate::error::ExportError;

/// Content types accepted for uploads: xls, xlsx and ods.
pub const SPREADSHEET_CONTENT_TYPES: [&str; 3] = [
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.oasis.opendocument.spreadsheet",
];

const FIRST_NAME: &str = "Vorname";
const LAST_NAME: &str = "Nachname";
const PATIENT_ID: &str = "Patienten-ID";
const STATION_NAME: &str = "Stationsname";
const SEMI_STATIONARY: &str = "Teilstationär";
const FULLY_STATIONARY: &str = "Vollstationär";
const ADMISSION: &str = "Aufnahmetag";
const DISCHARGE: &str = "Entlassungstag";
const REPEATING: &str = "Wiederkehrend";

static EMPTY: Data = Data::Empty;

/// Reject anything that is not a spreadsheet before reading a byte of it.
pub fn ensure_spreadsheet(content_type: Option<&str>) -> Result<(), ExportError> {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if SPREADSHEET_CONTENT_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(essence))
    {
        Ok(())
    } else {
        Err(ExportError::UnsupportedFileType(essence.to_string()))
    }
}

/// One imported patient row.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientImportRow {
    /// 1-based sheet row, counting the header.
    pub row: usize,
    pub patient_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub station_name: String,
    pub visit_type: VisitType,
    pub is_repeating_visit: bool,
    pub admitted_at: DateTime,
    /// Empty while the patient has not been discharged.
    pub discharged_at: Option<DateTime>,
}

impl PatientImportRow {
    /// The hospital day record this row describes for `date`.
    pub fn to_record(&self, station_id: i64, date: Date) -> PatientDayRecord {
        PatientDayRecord {
            patient_id: self.patient_id,
            station_id,
            date,
            visit_type: self.visit_type,
            is_repeating_visit: self.is_repeating_visit,
            uses_quarter_entry: false,
            admitted_at: self.admitted_at,
            discharged_at: self.discharged_at.unwrap_or(DateTime::MAX),
        }
    }
}

/// A row that could not be imported; `row` is 1-based as shown in Excel,
/// counting the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub rows: Vec<PatientImportRow>,
    pub errors: Vec<RowError>,
}

/// Read the first worksheet of an xls, xlsx or ods file.
///
/// A missing column fails the whole import; a malformed row is reported
/// and skipped.
pub fn read_patient_rows(bytes: &[u8]) -> Result<ImportReport, ExportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ExportError::EmptyWorkbook)??;

    let mut rows = range.rows();
    let header = rows.next().ok_or(ExportError::EmptyWorkbook)?;
    let columns = Columns::locate(header)?;

    let mut report = ImportReport::default();
    for (index, row) in rows.enumerate() {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let row_number = index + 2;
        match columns.parse(row_number, row) {
            Ok(parsed) => report.rows.push(parsed),
            Err(message) => {
                tracing::warn!(row = row_number, %message, "skipping patient import row");
                report.errors.push(RowError {
                    row: row_number,
                    message,
                });
            }
        }
    }

    tracing::info!(
        imported = report.rows.len(),
        rejected = report.errors.len(),
        "patient import read"
    );
    Ok(report)
}

struct Columns {
    first_name: usize,
    last_name: usize,
    patient_id: usize,
    station_name: usize,
    semi_stationary: usize,
    fully_stationary: usize,
    admission: usize,
    discharge: usize,
    repeating: usize,
}

impl Columns {
    fn locate(header: &[Data]) -> Result<Self, ExportError> {
        let find = |name: &'static str| {
            header
                .iter()
                .position(|c| matches!(c, Data::String(s) if s.trim() == name))
                .ok_or(ExportError::MissingColumn(name))
        };

        Ok(Self {
            first_name: find(FIRST_NAME)?,
            last_name: find(LAST_NAME)?,
            patient_id: find(PATIENT_ID)?,
            station_name: find(STATION_NAME)?,
            semi_stationary: find(SEMI_STATIONARY)?,
            fully_stationary: find(FULLY_STATIONARY)?,
            admission: find(ADMISSION)?,
            discharge: find(DISCHARGE)?,
            repeating: find(REPEATING)?,
        })
    }

    fn parse(&self, row_number: usize, row: &[Data]) -> Result<PatientImportRow, String> {
        let cell = |i: usize| row.get(i).unwrap_or(&EMPTY);

        let patient_id = integer(cell(self.patient_id))
            .ok_or_else(|| format!("{PATIENT_ID} is not a number"))?;
        let station_name = text(cell(self.station_name));
        if station_name.is_empty() {
            return Err(format!("{STATION_NAME} is empty"));
        }
        let admitted_at = datetime(cell(self.admission))
            .ok_or_else(|| format!("{ADMISSION} is not a date"))?;
        let discharged_at = match cell(self.discharge) {
            Data::Empty => None,
            c => Some(datetime(c).ok_or_else(|| format!("{DISCHARGE} is not a date"))?),
        };

        let visit_type = if yes(cell(self.semi_stationary)) {
            VisitType::SemiStationary
        } else if yes(cell(self.fully_stationary)) {
            VisitType::FullyStationary
        } else {
            VisitType::Ambulatory
        };

        Ok(PatientImportRow {
            row: row_number,
            patient_id,
            first_name: text(cell(self.first_name)),
            last_name: text(cell(self.last_name)),
            station_name,
            visit_type,
            is_repeating_visit: yes(cell(self.repeating)),
            admitted_at,
            discharged_at,
        })
    }
}

fn text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        _ => String::new(),
    }
}

fn yes(cell: &Data) -> bool {
    match cell {
        Data::String(s) => s.trim() == "Ja",
        Data::Bool(b) => *b,
        _ => false,
    }
}

fn integer(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn datetime(cell: &Data) -> Option<DateTime> {
    match cell {
        Data::DateTime(dt) => from_serial(dt.as_f64()),
        Data::Float(f) => from_serial(*f),
        Data::DateTimeIso(s) | Data::String(s) => parse_datetime(s.trim()),
        _ => None,
    }
}

/// Spreadsheet serial days count from 1899-12-30.
fn from_serial(serial: f64) -> Option<DateTime> {
    if !serial.is_finite() {
        return None;
    }
    let seconds = (serial * 86_400.0).round() as i64;
    date(1899, 12, 30)
        .at(0, 0, 0, 0)
        .checked_add(seconds.seconds())
        .ok()
}

fn parse_datetime(input: &str) -> Option<DateTime> {
    if let Ok(dt) = input.parse::<DateTime>() {
        return Some(dt);
    }
    ["%d.%m.%Y %H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|f| DateTime::strptime(f, input).ok())
        .or_else(|| {
            ["%Y-%m-%d", "%d.%m.%Y"]
                .iter()
                .find_map(|f| Date::strptime(f, input).ok())
                .map(|d| d.at(0, 0, 0, 0))
        })
}
