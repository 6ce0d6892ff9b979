//! Per-cell formatting the bridge can change

/// A hyperlink attached to a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    /// Target URL or in-workbook reference
    pub address: String,
    /// Text shown in the cell
    pub text_to_display: String,
    /// Tooltip
    pub screen_tip: String,
}

/// Formatting of a single cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellFormat {
    /// Background fill, as a `#RRGGBB` string
    pub fill_color: Option<String>,
    /// Number format code (e.g. `0.00%`)
    pub number_format: Option<String>,
    pub hyperlink: Option<Hyperlink>,
}

impl CellFormat {
    /// True when nothing differs from the default format
    pub fn is_default(&self) -> bool {
        self.fill_color.is_none() && self.number_format.is_none() && self.hyperlink.is_none()
    }
}
