//! Lays analysis results out as rows before they are written to a workbook.

use caretracker_analysis::aggregate::{
    COMBINED_STATION_ID, StationMinutes, StationSeries, combined_daily, combined_series,
};

use crate::styles::SheetStyles;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    Plain,
    /// Bold on a light fill.
    Subtotal,
    /// Bold, white on black.
    Total,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub style: RowStyle,
}

impl Row {
    fn new(cells: Vec<Cell>, style: RowStyle) -> Self {
        Self { cells, style }
    }

    fn blank() -> Self {
        Self::new(Vec::new(), RowStyle::Plain)
    }

    pub fn is_bold(&self) -> bool {
        self.style != RowStyle::Plain
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub title: &'static str,
    pub width: f64,
}

/// A single worksheet: header columns plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

/// Daily analysis: one row per station, then the bold "Gesamt" row.
///
/// A combined entry already in the input is dropped and recomputed.
pub fn render_daily(stations: &[StationMinutes], styles: &SheetStyles) -> Sheet {
    let mut rows: Vec<Row> = stations
        .iter()
        .filter(|s| s.id != COMBINED_STATION_ID)
        .map(|s| {
            Row::new(
                vec![id(s.id), Cell::Text(s.name.clone()), minutes(s.minutes)],
                RowStyle::Plain,
            )
        })
        .collect();

    let total = combined_daily(stations);
    rows.push(Row::new(
        vec![id(total.id), Cell::Text(total.name), minutes(total.minutes)],
        RowStyle::Total,
    ));

    Sheet {
        name: styles.sheet_name.clone(),
        columns: vec![
            Column { title: "ID", width: styles.id_width },
            Column { title: "Name", width: styles.name_width },
            Column { title: "Minuten", width: styles.minutes_width },
        ],
        rows,
    }
}

/// Monthly or quarterly analysis: per station its day rows, a bold
/// "<name> - Summe" row and a blank row; the bold "Gesamt" row closes the
/// sheet.
pub fn render_monthly(series: &[StationSeries], styles: &SheetStyles) -> Sheet {
    let mut rows = Vec::new();

    for s in series.iter().filter(|s| s.id != COMBINED_STATION_ID) {
        for point in &s.data {
            rows.push(Row::new(
                vec![
                    id(s.id),
                    Cell::Text(s.name.clone()),
                    Cell::Number(f64::from(point.day)),
                    minutes(point.minutes),
                ],
                RowStyle::Plain,
            ));
        }
        rows.push(Row::new(
            vec![
                id(s.id),
                Cell::Text(format!("{} - Summe", s.name)),
                Cell::Empty,
                minutes(s.sum),
            ],
            RowStyle::Subtotal,
        ));
        rows.push(Row::blank());
    }

    let total = combined_series(series);
    rows.push(Row::new(
        vec![
            id(total.id),
            Cell::Text(total.name),
            Cell::Empty,
            minutes(total.sum),
        ],
        RowStyle::Total,
    ));

    Sheet {
        name: styles.sheet_name.clone(),
        columns: vec![
            Column { title: "ID", width: styles.id_width },
            Column { title: "Name", width: styles.name_width },
            Column { title: "Tag", width: styles.day_width },
            Column { title: "Minuten", width: styles.minutes_width },
        ],
        rows,
    }
}

fn id(value: i64) -> Cell {
    // Station ids are small; f64 holds them exactly.
    Cell::Number(value as f64)
}

fn minutes(value: u32) -> Cell {
    Cell::Number(f64::from(value))
}
