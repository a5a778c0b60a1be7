use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("XLSX generation failed: {0}")]
    Xlsx(String),

    #[error("Bitte nur Excel-Dateien hochladen (.xls, .xlsx oder .ods)")]
    UnsupportedFileType(String),

    #[error("spreadsheet could not be read: {0}")]
    Spreadsheet(String),

    #[error("spreadsheet has no worksheet")]
    EmptyWorkbook,

    #[error("missing column: {0}")]
    MissingColumn(&'static str),
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Xlsx(e.to_string())
    }
}

impl From<calamine::Error> for ExportError {
    fn from(e: calamine::Error) -> Self {
        ExportError::Spreadsheet(e.to_string())
    }
}
