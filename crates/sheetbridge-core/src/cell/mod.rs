//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")

mod address;
mod value;

pub use address::{parse_reference, quote_sheet_name, strip_sheet_prefix, CellAddress, CellRange};
pub use value::{CellError, CellValue};
