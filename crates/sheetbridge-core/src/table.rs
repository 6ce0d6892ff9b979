//! Worksheet tables (list objects)

use crate::cell::CellRange;

/// A table occupying a rectangular range of a worksheet
///
/// The header row, when shown, is the first row of [`Table::range`]; the
/// total row, when shown, is the last one. Everything in between is the data
/// body, which always has at least one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Workbook-unique table name
    pub name: String,
    /// Full range including header and total rows
    pub range: CellRange,
    pub show_headers: bool,
    pub show_totals: bool,
    /// Style name such as `TableStyleMedium2`
    pub style: String,
    pub show_autofilter: bool,
}

/// Style applied to tables created without an explicit one
pub const DEFAULT_TABLE_STYLE: &str = "TableStyleMedium2";

impl Table {
    /// Create a table with headers shown and the default style
    pub fn new(name: impl Into<String>, range: CellRange, show_headers: bool) -> Self {
        Self {
            name: name.into(),
            range,
            show_headers,
            show_totals: false,
            style: DEFAULT_TABLE_STYLE.to_string(),
            show_autofilter: show_headers,
        }
    }

    /// The header row, if headers are shown
    pub fn header_row_range(&self) -> Option<CellRange> {
        self.show_headers.then(|| {
            CellRange::from_indices(
                self.range.start.row,
                self.range.start.col,
                self.range.start.row,
                self.range.end.col,
            )
        })
    }

    /// The total row, if totals are shown
    pub fn total_row_range(&self) -> Option<CellRange> {
        self.show_totals.then(|| {
            CellRange::from_indices(
                self.range.end.row,
                self.range.start.col,
                self.range.end.row,
                self.range.end.col,
            )
        })
    }

    /// Rows between the header and total rows
    pub fn data_body_range(&self) -> CellRange {
        let start = self.range.start.row + u32::from(self.show_headers);
        let end = self
            .range
            .end
            .row
            .saturating_sub(u32::from(self.show_totals))
            .max(start);
        CellRange::from_indices(start, self.range.start.col, end, self.range.end.col)
    }

    /// Show or hide the total row
    ///
    /// Showing totals grows the table by one row below the data body, hiding
    /// them shrinks it again.
    pub fn set_show_totals(&mut self, show: bool) {
        if show == self.show_totals {
            return;
        }
        if show {
            self.range.end.row += 1;
        } else {
            self.range.end.row = self.range.end.row.saturating_sub(1).max(self.range.start.row);
        }
        self.show_totals = show;
    }
}
