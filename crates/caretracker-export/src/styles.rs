use serde::{Deserialize, Serialize};

/// Sheet styling for analysis exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetStyles {
    /// Name of the single worksheet.
    pub sheet_name: String,

    /// Column widths in characters.
    pub id_width: f64,
    pub name_width: f64,
    pub day_width: f64,
    pub minutes_width: f64,

    /// Font and fill of the grand total row, as 0xRRGGBB.
    pub total_font_color: u32,
    pub total_fill_color: u32,

    /// Fill of the per-station sum rows of the monthly export.
    pub subtotal_fill_color: u32,
}

impl Default for SheetStyles {
    fn default() -> Self {
        Self {
            sheet_name: "Analyse".to_string(),
            id_width: 10.0,
            name_width: 30.0,
            day_width: 10.0,
            minutes_width: 15.0,
            total_font_color: 0xFFFFFF,
            total_fill_color: 0x000000,
            subtotal_fill_color: 0xEEEEEE,
        }
    }
}
