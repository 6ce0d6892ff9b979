//! # sheetbridge-core
//!
//! In-memory workbook model used by the sheetbridge client.
//!
//! This crate provides:
//! - [`CellValue`] - cell values, with dates as a first-class variant
//! - [`CellAddress`] and [`CellRange`] - A1 addressing, including sheet-qualified references
//! - [`Workbook`], [`Worksheet`] - sheets, defined names, tables, pictures and formats
//! - [`date`] - serial/ISO-8601 conversion and number-format categories
//!
//! ## Example
//!
//! ```rust
//! use sheetbridge_core::{CellRange, CellValue, Workbook};
//!
//! let mut workbook = Workbook::new("Book1.xlsx");
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", "Hello").unwrap();
//! sheet.set_cell_value_at(1, 1, CellValue::Number(3.5)).unwrap();
//!
//! assert_eq!(sheet.used_range(), Some(CellRange::parse("A1:B2").unwrap()));
//! ```

pub mod cell;
pub mod date;
pub mod error;
pub mod format;
pub mod named_range;
pub mod picture;
pub mod table;
pub mod workbook;
pub mod worksheet;

pub use cell::{
    parse_reference, quote_sheet_name, strip_sheet_prefix, CellAddress, CellError, CellRange,
    CellValue,
};
pub use date::NumberFormatCategory;
pub use error::{Error, Result};
pub use format::{CellFormat, Hyperlink};
pub use named_range::{NameScope, NamedRange, NamedRangeCollection};
pub use picture::Picture;
pub use table::Table;
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::{CellBlock, FormatOrigin, Shift, Worksheet};

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
