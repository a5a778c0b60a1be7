use jiff::civil::DateTime;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};

use caretracker_analysis::aggregate::{StationMinutes, StationSeries};
use caretracker_core::dates::format_timestamp_stamp;

use crate::error::ExportError;
use crate::render::{Cell, Row, RowStyle, Sheet, render_daily, render_monthly};
use crate::styles::SheetStyles;

/// Which analysis a workbook holds; decides the download file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Daily,
    Monthly,
}

impl ExportKind {
    fn suffix(self) -> &'static str {
        match self {
            ExportKind::Daily => "Tägliche_Analyse",
            ExportKind::Monthly => "Monatliche_Analyse",
        }
    }
}

/// `dd-mm-yyyy-hh:mm_Tägliche_Analyse.xlsx` and its monthly counterpart.
pub fn export_filename(kind: ExportKind, now: DateTime) -> String {
    format!("{}_{}.xlsx", format_timestamp_stamp(now), kind.suffix())
}

pub fn export_daily(stations: &[StationMinutes], styles: &SheetStyles) -> Result<Vec<u8>, ExportError> {
    generate_xlsx(&render_daily(stations, styles), styles)
}

pub fn export_monthly(series: &[StationSeries], styles: &SheetStyles) -> Result<Vec<u8>, ExportError> {
    generate_xlsx(&render_monthly(series, styles), styles)
}

/// Write a laid-out sheet to XLSX bytes. Row 0 holds the column titles.
pub fn generate_xlsx(sheet: &Sheet, styles: &SheetStyles) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sheet.name)?;

    for (col, column) in (0u16..).zip(&sheet.columns) {
        worksheet.set_column_width(col, column.width)?;
        worksheet.write_string(0, col, column.title)?;
    }

    let subtotal = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(styles.subtotal_fill_color));
    let total = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(styles.total_font_color))
        .set_background_color(Color::RGB(styles.total_fill_color));

    for (index, row) in (1u32..).zip(&sheet.rows) {
        let format = match row.style {
            RowStyle::Plain => None,
            RowStyle::Subtotal => Some(&subtotal),
            RowStyle::Total => Some(&total),
        };
        write_row(worksheet, index, row, format)?;
    }

    let bytes = workbook.save_to_buffer()?;
    tracing::debug!(rows = sheet.rows.len(), bytes = bytes.len(), "xlsx generated");
    Ok(bytes)
}

fn write_row(
    worksheet: &mut Worksheet,
    index: u32,
    row: &Row,
    format: Option<&Format>,
) -> Result<(), ExportError> {
    for (col, cell) in (0u16..).zip(&row.cells) {
        match (cell, format) {
            (Cell::Text(text), Some(f)) => {
                worksheet.write_string_with_format(index, col, text, f)?;
            }
            (Cell::Text(text), None) => {
                worksheet.write_string(index, col, text)?;
            }
            (Cell::Number(n), Some(f)) => {
                worksheet.write_number_with_format(index, col, *n, f)?;
            }
            (Cell::Number(n), None) => {
                worksheet.write_number(index, col, *n)?;
            }
            (Cell::Empty, Some(f)) => {
                worksheet.write_blank(index, col, f)?;
            }
            (Cell::Empty, None) => {}
        }
    }
    Ok(())
}
