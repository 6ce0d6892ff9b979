//! Worksheet type

use std::collections::{BTreeMap, BTreeSet};

use crate::cell::{CellAddress, CellRange, CellValue};
use crate::error::{Error, Result};
use crate::format::CellFormat;
use crate::picture::Picture;
use crate::table::Table;
use crate::{MAX_COLS, MAX_ROWS};

/// Direction remaining cells move when a range is deleted or inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Up,
    Left,
    Down,
    Right,
}

/// Where inserted cells take their formatting from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatOrigin {
    LeftOrAbove,
    RightOrBelow,
}

/// Values and formats lifted out of a range, ready to paste elsewhere
#[derive(Debug, Clone, Default)]
pub struct CellBlock {
    rows: u32,
    cols: u16,
    values: BTreeMap<(u32, u16), CellValue>,
    formats: BTreeMap<(u32, u16), CellFormat>,
}

type Key = (u32, u16);

static EMPTY: CellValue = CellValue::Empty;

/// A worksheet (single sheet in a workbook)
///
/// Cells are stored sparsely, keyed by `(row, col)`, which also keeps them in
/// row-major order.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    values: BTreeMap<Key, CellValue>,
    formats: BTreeMap<Key, CellFormat>,
    tables: Vec<Table>,
    pictures: Vec<Picture>,
    autofit_columns: BTreeSet<u16>,
    autofit_rows: BTreeSet<u32>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
            formats: BTreeMap::new(),
            tables: Vec::new(),
            pictures: Vec::new(),
            autofit_columns: BTreeSet::new(),
            autofit_rows: BTreeSet::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // ==================== Values ====================

    /// Get a cell value by 0-based indices
    pub fn cell_value_at(&self, row: u32, col: u16) -> &CellValue {
        self.values.get(&(row, col)).unwrap_or(&EMPTY)
    }

    /// Get a cell value by A1 address
    pub fn cell_value(&self, address: &str) -> Result<&CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_value_at(addr.row, addr.col))
    }

    /// Set a cell value by 0-based indices
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        check_bounds(row, col)?;
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&(row, col));
        } else {
            self.values.insert((row, col), value);
        }
        Ok(())
    }

    /// Set a cell value by A1 address
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Write a row-major block of values with its top-left corner at `start`
    pub fn set_values(&mut self, start: CellAddress, rows: Vec<Vec<CellValue>>) -> Result<()> {
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                let addr = CellAddress::checked(start.row + r as u32, start.col as u32 + c as u32)?;
                self.set_cell_value_at(addr.row, addr.col, value)?;
            }
        }
        Ok(())
    }

    /// Read a range as a row-major matrix
    pub fn values_in(&self, range: &CellRange) -> Vec<Vec<CellValue>> {
        (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| self.cell_value_at(row, col).clone())
                    .collect()
            })
            .collect()
    }

    /// The smallest range starting at A1 that covers every value or format
    ///
    /// `None` for a sheet with nothing on it.
    pub fn used_range(&self) -> Option<CellRange> {
        let keys = self.values.keys().chain(self.formats.keys());
        let mut last: Option<Key> = None;
        for &(row, col) in keys {
            last = Some(match last {
                Some((r, c)) => (r.max(row), c.max(col)),
                None => (row, col),
            });
        }
        last.map(|(row, col)| CellRange::from_indices(0, 0, row, col))
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.values.len()
    }

    // ==================== Formats ====================

    /// Formatting of a cell, if it has any
    pub fn cell_format(&self, row: u32, col: u16) -> Option<&CellFormat> {
        self.formats.get(&(row, col))
    }

    /// Cells carrying a format, in row-major order
    pub fn formatted_cells(&self) -> impl Iterator<Item = (CellAddress, &CellFormat)> + '_ {
        self.formats
            .iter()
            .map(|(&(row, col), format)| (CellAddress::new(row, col), format))
    }

    /// Apply `f` to the format of every cell in `range`
    pub fn update_formats<F: FnMut(&mut CellFormat)>(&mut self, range: &CellRange, mut f: F) {
        for addr in range.cells() {
            let key = (addr.row, addr.col);
            let format = self.formats.entry(key).or_default();
            f(format);
            if format.is_default() {
                self.formats.remove(&key);
            }
        }
    }

    // ==================== Clearing ====================

    /// Remove values in a range, keeping formats
    pub fn clear_contents(&mut self, range: &CellRange) {
        self.values.retain(|&(r, c), _| !range.contains(r, c));
    }

    /// Remove formats in a range, keeping values
    pub fn clear_formats(&mut self, range: &CellRange) {
        self.formats.retain(|&(r, c), _| !range.contains(r, c));
    }

    /// Remove values and formats in a range
    pub fn clear(&mut self, range: &CellRange) {
        self.clear_contents(range);
        self.clear_formats(range);
    }

    /// Remove every value on the sheet
    pub fn clear_all_contents(&mut self) {
        self.values.clear();
    }

    /// Remove every format on the sheet
    pub fn clear_all_formats(&mut self) {
        self.formats.clear();
        self.autofit_columns.clear();
        self.autofit_rows.clear();
    }

    // ==================== Structure ====================

    /// Delete a range, moving the cells below it up or the cells right of it left
    pub fn delete_range(&mut self, range: &CellRange, shift: Shift) -> Result<()> {
        if matches!(shift, Shift::Down | Shift::Right) {
            return Err(Error::other("cells can only shift up or left on delete"));
        }
        let rows = range.row_count();
        let cols = range.col_count();
        let mover = |(r, c): Key| -> Option<Key> {
            match shift {
                Shift::Up if c >= range.start.col && c <= range.end.col => {
                    if r < range.start.row {
                        Some((r, c))
                    } else if r <= range.end.row {
                        None
                    } else {
                        Some((r - rows, c))
                    }
                }
                Shift::Left if r >= range.start.row && r <= range.end.row => {
                    if c < range.start.col {
                        Some((r, c))
                    } else if c <= range.end.col {
                        None
                    } else {
                        Some((r, c - cols))
                    }
                }
                _ => Some((r, c)),
            }
        };
        remap(&mut self.values, &mover);
        remap(&mut self.formats, &mover);
        self.move_objects(&mover, range.start);
        Ok(())
    }

    /// Insert blank cells at a range, moving existing cells down or right
    ///
    /// Cells pushed past the sheet edge are dropped. With a `format_origin`,
    /// the inserted cells copy the formatting of their neighbours.
    pub fn insert_range(
        &mut self,
        range: &CellRange,
        shift: Shift,
        format_origin: Option<FormatOrigin>,
    ) -> Result<()> {
        if matches!(shift, Shift::Up | Shift::Left) {
            return Err(Error::other("cells can only shift down or right on insert"));
        }
        let rows = range.row_count();
        let cols = range.col_count() as u32;
        let mover = |(r, c): Key| -> Option<Key> {
            match shift {
                Shift::Down if c >= range.start.col && c <= range.end.col && r >= range.start.row => {
                    let row = r + rows;
                    (row < MAX_ROWS).then_some((row, c))
                }
                Shift::Right if r >= range.start.row && r <= range.end.row && c >= range.start.col => {
                    let col = c as u32 + cols;
                    (col < MAX_COLS as u32).then_some((r, col as u16))
                }
                _ => Some((r, c)),
            }
        };
        remap(&mut self.values, &mover);
        remap(&mut self.formats, &mover);
        self.move_objects(&mover, range.start);

        if let Some(origin) = format_origin {
            self.copy_neighbour_formats(range, shift, origin);
        }
        Ok(())
    }

    /// Carry tables and pictures along with the cells under them
    ///
    /// A table moves when both of its corners do, and grows or shrinks when
    /// only its bottom-right corner moves. A picture whose anchor cell was
    /// deleted lands on `fallback`.
    fn move_objects<F>(&mut self, mover: F, fallback: CellAddress)
    where
        F: Fn(Key) -> Option<Key>,
    {
        for table in &mut self.tables {
            let start = mover((table.range.start.row, table.range.start.col));
            let end = mover((table.range.end.row, table.range.end.col));
            if let (Some(start), Some(end)) = (start, end) {
                if start.0 <= end.0 && start.1 <= end.1 {
                    table.range = CellRange::from_indices(start.0, start.1, end.0, end.1);
                }
            }
        }
        for picture in &mut self.pictures {
            let (row, col) = mover((picture.anchor.row, picture.anchor.col))
                .unwrap_or((fallback.row, fallback.col));
            picture.anchor = CellAddress::new(row, col);
        }
    }

    fn copy_neighbour_formats(&mut self, range: &CellRange, shift: Shift, origin: FormatOrigin) {
        for addr in range.cells() {
            let source = match (shift, origin) {
                (Shift::Down, FormatOrigin::LeftOrAbove) => {
                    range.start.row.checked_sub(1).map(|r| (r, addr.col))
                }
                (Shift::Down, FormatOrigin::RightOrBelow) => Some((range.end.row + 1, addr.col)),
                (Shift::Right, FormatOrigin::LeftOrAbove) => {
                    range.start.col.checked_sub(1).map(|c| (addr.row, c))
                }
                (Shift::Right, FormatOrigin::RightOrBelow) => Some((addr.row, range.end.col + 1)),
                _ => None,
            };
            if let Some(format) = source.and_then(|key| self.formats.get(&key)).cloned() {
                self.formats.insert((addr.row, addr.col), format);
            }
        }
    }

    /// Copy values and formats out of a range
    pub fn copy_block(&self, range: &CellRange) -> CellBlock {
        let rebase = |&(r, c): &Key| (r - range.start.row, c - range.start.col);
        CellBlock {
            rows: range.row_count(),
            cols: range.col_count(),
            values: self
                .values
                .iter()
                .filter(|(key, _)| range.contains(key.0, key.1))
                .map(|(k, v)| (rebase(k), v.clone()))
                .collect(),
            formats: self
                .formats
                .iter()
                .filter(|(key, _)| range.contains(key.0, key.1))
                .map(|(k, v)| (rebase(k), v.clone()))
                .collect(),
        }
    }

    /// Paste a block with its top-left corner at `dest`, replacing what was there
    pub fn paste_block(&mut self, dest: CellAddress, block: &CellBlock) -> Result<()> {
        let target = CellRange::from_position(
            dest.row,
            dest.col as u32,
            block.rows,
            block.cols as u32,
        )?;
        self.clear(&target);
        for (&(r, c), value) in &block.values {
            self.values.insert((dest.row + r, dest.col + c), value.clone());
        }
        for (&(r, c), format) in &block.formats {
            self.formats.insert((dest.row + r, dest.col + c), format.clone());
        }
        Ok(())
    }

    // ==================== Autofit ====================

    /// Mark the columns of a range as fitted to their content
    pub fn autofit_columns(&mut self, range: &CellRange) {
        self.autofit_columns
            .extend(range.start.col..=range.end.col);
    }

    /// Mark the rows of a range as fitted to their content
    pub fn autofit_rows(&mut self, range: &CellRange) {
        self.autofit_rows.extend(range.start.row..=range.end.row);
    }

    pub fn autofitted_columns(&self) -> impl Iterator<Item = u16> + '_ {
        self.autofit_columns.iter().copied()
    }

    pub fn autofitted_rows(&self) -> impl Iterator<Item = u32> + '_ {
        self.autofit_rows.iter().copied()
    }

    // ==================== Tables ====================

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_mut(&mut self, index: usize) -> Result<&mut Table> {
        let count = self.tables.len();
        self.tables
            .get_mut(index)
            .ok_or(Error::TableOutOfBounds(index, count))
    }

    pub(crate) fn push_table(&mut self, table: Table) -> usize {
        self.tables.push(table);
        self.tables.len() - 1
    }

    // ==================== Pictures ====================

    pub fn pictures(&self) -> &[Picture] {
        &self.pictures
    }

    pub fn picture_mut(&mut self, index: usize) -> Result<&mut Picture> {
        let count = self.pictures.len();
        self.pictures
            .get_mut(index)
            .ok_or(Error::PictureOutOfBounds(index, count))
    }

    /// Add a picture, naming it `Picture N` when no name is given
    pub fn add_picture(&mut self, mut picture: Picture) -> usize {
        if picture.name.is_empty() {
            picture.name = self.next_picture_name();
        }
        self.pictures.push(picture);
        self.pictures.len() - 1
    }

    pub fn remove_picture(&mut self, index: usize) -> Result<Picture> {
        if index >= self.pictures.len() {
            return Err(Error::PictureOutOfBounds(index, self.pictures.len()));
        }
        Ok(self.pictures.remove(index))
    }

    fn next_picture_name(&self) -> String {
        let mut n = self.pictures.len() + 1;
        loop {
            let name = format!("Picture {}", n);
            if !self.pictures.iter().any(|p| p.name == name) {
                return name;
            }
            n += 1;
        }
    }
}

fn check_bounds(row: u32, col: u16) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
    }
    if col >= MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
    }
    Ok(())
}

/// Rebuild a cell map, moving or dropping each key
fn remap<T, F>(map: &mut BTreeMap<Key, T>, f: F)
where
    F: Fn(Key) -> Option<Key>,
{
    let old = std::mem::take(map);
    for (key, value) in old {
        if let Some(new_key) = f(key) {
            map.insert(new_key, value);
        }
    }
}
