//! The workbook seen through a spreadsheet client.
//!
//! A [`Host`] is everything the bridge needs from the application it runs in:
//! a way to read the workbook for the payload and one mutation per action
//! family. Rows and columns are 0-based throughout.
//!
//! Hosts differ in what they can do. Tables, pictures and names have default
//! implementations returning [`Error::NotImplemented`], so a binding without
//! them still runs every other action.

use sheetbridge_core::{CellAddress, CellRange, CellValue, Hyperlink, NameScope};
use sheetbridge_protocol::{
    AlertMode, AutofitAxis, Buttons, ClearScope, CopyOrigin, DeleteShift, InsertShift, NameInfo,
    PictureInfo, RangeRef, TableInfo,
};

use crate::error::{Error, Result};

/// Table flag toggled by the `show*Table` actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFlag {
    Headers,
    Totals,
    Autofilter,
}

/// A spreadsheet application the bridge can read and drive.
pub trait Host {
    // ==================== Reading ====================

    /// Client name reported in the payload (e.g. `"Office.js"`)
    fn client_name(&self) -> &str;

    fn book_name(&self) -> Result<String>;

    /// Sheet names in workbook order
    fn sheet_names(&self) -> Result<Vec<String>>;

    fn active_sheet_index(&self) -> Result<usize>;

    /// Address of the current selection; it may carry a sheet prefix.
    fn selection(&self) -> Result<Option<String>>;

    /// Contiguous block of cells starting at A1 of `sheet_name`
    ///
    /// `None` when no such sheet exists.
    fn config_region(&self, sheet_name: &str) -> Result<Option<Vec<Vec<CellValue>>>>;

    /// Values of the used range from A1, date-formatted numbers already read as dates.
    ///
    /// An empty sheet returns an empty matrix.
    fn used_values(&self, sheet: usize) -> Result<Vec<Vec<CellValue>>>;

    /// Defined names that refer to ranges; addresses may carry a sheet prefix.
    fn names(&self) -> Result<Vec<NameInfo>> {
        Ok(Vec::new())
    }

    fn tables(&self, _sheet: usize) -> Result<Vec<TableInfo>> {
        Ok(Vec::new())
    }

    fn pictures(&self, _sheet: usize) -> Result<Vec<PictureInfo>> {
        Ok(Vec::new())
    }

    /// Flush pending changes so later actions see a consistent structure.
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    // ==================== Cells ====================

    fn set_values(&mut self, range: &RangeRef, values: Vec<Vec<CellValue>>) -> Result<()>;

    fn clear_range(&mut self, range: &RangeRef, scope: ClearScope) -> Result<()>;

    fn set_range_color(&mut self, range: &RangeRef, color: &str) -> Result<()>;

    fn add_hyperlink(&mut self, range: &RangeRef, hyperlink: Hyperlink) -> Result<()>;

    fn set_number_format(&mut self, range: &RangeRef, format: &str) -> Result<()>;

    fn autofit(&mut self, range: &RangeRef, axis: AutofitAxis) -> Result<()>;

    fn delete_range(&mut self, range: &RangeRef, shift: DeleteShift) -> Result<()>;

    fn insert_range(
        &mut self,
        range: &RangeRef,
        shift: InsertShift,
        copy_origin: Option<CopyOrigin>,
    ) -> Result<()>;

    fn select_range(&mut self, range: &RangeRef) -> Result<()>;

    /// Copy `source` to `dest_address` (A1, possibly sheet-qualified) on `dest_sheet`
    fn copy_range(&mut self, source: &RangeRef, dest_sheet: usize, dest_address: &str)
        -> Result<()>;

    // ==================== Sheets ====================

    /// Insert a sheet at `position`; the host picks a name when none is given
    fn add_sheet(&mut self, position: usize, name: Option<&str>) -> Result<()>;

    fn set_sheet_name(&mut self, sheet: usize, name: &str) -> Result<()>;

    fn delete_sheet(&mut self, sheet: usize) -> Result<()>;

    fn clear_sheet(&mut self, sheet: usize, scope: ClearScope) -> Result<()>;

    fn activate_sheet(&mut self, sheet: usize) -> Result<()>;

    // ==================== Names ====================

    fn set_range_name(&mut self, _range: &RangeRef, _name: &str) -> Result<()> {
        Err(Error::not_implemented("setRangeName"))
    }

    /// Define a name; `sheet` set means the name is scoped to that sheet
    fn add_name(&mut self, _sheet: Option<usize>, _name: &str, _refers_to: &str) -> Result<()> {
        Err(Error::not_implemented("namesAdd"))
    }

    fn delete_name(&mut self, _name: &str, _scope: NameScope) -> Result<()> {
        Err(Error::not_implemented("nameDelete"))
    }

    // ==================== Tables ====================

    fn add_table(
        &mut self,
        _sheet: usize,
        _source_address: &str,
        _has_headers: bool,
        _style: Option<&str>,
        _name: Option<&str>,
    ) -> Result<()> {
        Err(Error::not_implemented("addTable"))
    }

    fn set_table_name(&mut self, _sheet: usize, _table: usize, _name: &str) -> Result<()> {
        Err(Error::not_implemented("setTableName"))
    }

    fn resize_table(&mut self, _sheet: usize, _table: usize, _address: &str) -> Result<()> {
        Err(Error::not_implemented("resizeTable"))
    }

    fn set_table_flag(
        &mut self,
        _sheet: usize,
        _table: usize,
        _flag: TableFlag,
        _show: bool,
    ) -> Result<()> {
        Err(Error::not_implemented("show*Table"))
    }

    fn set_table_style(&mut self, _sheet: usize, _table: usize, _style: &str) -> Result<()> {
        Err(Error::not_implemented("setTableStyle"))
    }

    // ==================== Pictures ====================

    /// Place an image with its top-left corner at `anchor`, offset by `left`/`top` points
    fn add_picture(
        &mut self,
        _sheet: usize,
        _image: Vec<u8>,
        _anchor: CellAddress,
        _left: f64,
        _top: f64,
    ) -> Result<()> {
        Err(Error::not_implemented("addPicture"))
    }

    /// Swap the image of an existing picture, keeping its placement
    fn update_picture(
        &mut self,
        _sheet: usize,
        _index: usize,
        _image: Vec<u8>,
        _name: Option<&str>,
        _width: Option<f64>,
        _height: Option<f64>,
    ) -> Result<()> {
        Err(Error::not_implemented("updatePicture"))
    }

    fn delete_picture(&mut self, _sheet: usize, _index: usize) -> Result<()> {
        Err(Error::not_implemented("deletePicture"))
    }

    fn set_picture_name(&mut self, _sheet: usize, _index: usize, _name: &str) -> Result<()> {
        Err(Error::not_implemented("setPictureName"))
    }

    fn set_picture_size(
        &mut self,
        _sheet: usize,
        _index: usize,
        _width: Option<f64>,
        _height: Option<f64>,
    ) -> Result<()> {
        Err(Error::not_implemented("setPictureSize"))
    }

    // ==================== Dialogs ====================

    /// Show a modal message and return the button pressed (`"ok"`, `"cancel"`,
    /// `"yes"`, `"no"`), if any.
    fn alert(
        &mut self,
        prompt: &str,
        title: &str,
        buttons: Buttons,
        mode: AlertMode,
    ) -> Result<Option<String>>;
}

/// Cell range covered by a positional range reference
pub fn cell_range(range: &RangeRef) -> Result<CellRange> {
    Ok(CellRange::from_position(
        range.start_row,
        range.start_column,
        range.row_count,
        range.column_count,
    )?)
}
