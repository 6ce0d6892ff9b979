//! Workbook type - the main document structure

use crate::cell::{CellAddress, CellRange};
use crate::error::{Error, Result};
use crate::named_range::{NameScope, NamedRange, NamedRangeCollection};
use crate::table::Table;
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A workbook (spreadsheet document)
///
/// A workbook contains one or more worksheets, the defined names, the current
/// selection and a few global settings.
#[derive(Debug, Clone)]
pub struct Workbook {
    name: String,
    worksheets: Vec<Worksheet>,
    settings: WorkbookSettings,
    active_sheet: usize,
    /// Selected range on the active sheet
    selection: Option<CellRange>,
    named_ranges: NamedRangeCollection,
}

impl Workbook {
    /// Create a new workbook with one worksheet named `Sheet1`
    pub fn new(name: impl Into<String>) -> Self {
        let mut wb = Self::empty(name);
        wb.worksheets.push(Worksheet::new("Sheet1"));
        wb.selection = Some(CellRange::single(CellAddress::new(0, 0)));
        wb
    }

    /// Create an empty workbook with no worksheets
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            worksheets: Vec::new(),
            settings: WorkbookSettings::default(),
            active_sheet: 0,
            selection: None,
            named_ranges: NamedRangeCollection::new(),
        }
    }

    /// Workbook (file) name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by index, or an out-of-bounds error
    pub fn sheet(&self, index: usize) -> Result<&Worksheet> {
        let count = self.worksheets.len();
        self.worksheets
            .get(index)
            .ok_or(Error::SheetOutOfBounds(index, count))
    }

    /// Get a mutable worksheet by index, or an out-of-bounds error
    pub fn sheet_mut(&mut self, index: usize) -> Result<&mut Worksheet> {
        let count = self.worksheets.len();
        self.worksheets
            .get_mut(index)
            .ok_or(Error::SheetOutOfBounds(index, count))
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Get the index of a worksheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Add a new worksheet with specified name at the end
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name)?;

        let index = self.worksheets.len();
        self.worksheets.push(Worksheet::new(name));
        if self.selection.is_none() {
            self.selection = Some(CellRange::single(CellAddress::new(0, 0)));
        }
        Ok(index)
    }

    /// Add an existing worksheet to the workbook
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        let index = self.worksheets.len();
        self.worksheets.push(worksheet);
        Ok(index)
    }

    /// Insert a worksheet at `index`, generating `SheetN` when no name is given
    ///
    /// An index past the end appends. Returns the index the sheet landed at.
    pub fn insert_worksheet(&mut self, index: usize, name: Option<&str>) -> Result<usize> {
        let name = match name {
            Some(name) => {
                self.validate_sheet_name(name)?;
                name.to_string()
            }
            None => self.generate_sheet_name(),
        };
        let index = index.min(self.worksheets.len());

        self.worksheets.insert(index, Worksheet::new(name));
        self.named_ranges.sheet_inserted(index);

        if self.worksheets.len() > 1 && self.active_sheet >= index {
            self.active_sheet += 1;
        }

        Ok(index)
    }

    /// Remove a worksheet by index
    ///
    /// Names scoped to the sheet go with it.
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        if self.worksheets.len() == 1 {
            return Err(Error::other("a workbook must contain at least one sheet"));
        }

        let was_active = self.active_sheet == index;
        let worksheet = self.worksheets.remove(index);
        self.named_ranges.sheet_removed(index);

        if self.active_sheet > index || self.active_sheet >= self.worksheets.len() {
            self.active_sheet = self.active_sheet.saturating_sub(1);
        }
        if was_active {
            self.selection = Some(CellRange::single(CellAddress::new(0, 0)));
        }

        Ok(worksheet)
    }

    /// Rename a worksheet, rewriting names that refer to it
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }

        self.validate_sheet_name_excluding(new_name, Some(index))?;

        let old = self.worksheets[index].name().to_string();
        self.worksheets[index].set_name(new_name);
        self.named_ranges.sheet_renamed(&old, new_name);
        Ok(())
    }

    /// Get the active sheet index
    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    /// Activate a sheet; the selection moves to its A1
    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        if index != self.active_sheet {
            self.active_sheet = index;
            self.selection = Some(CellRange::single(CellAddress::new(0, 0)));
        }
        Ok(())
    }

    /// Selected range on the active sheet
    pub fn selection(&self) -> Option<CellRange> {
        self.selection
    }

    /// Select a range, activating its sheet
    pub fn select(&mut self, sheet: usize, range: CellRange) -> Result<()> {
        self.set_active_sheet(sheet)?;
        self.selection = Some(range);
        Ok(())
    }

    /// Get workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Get mutable workbook settings
    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    // ==================== Ranges ====================

    /// Copy values and formats from one sheet's range to another sheet
    pub fn copy_range(
        &mut self,
        source_sheet: usize,
        source: &CellRange,
        dest_sheet: usize,
        dest: CellAddress,
    ) -> Result<()> {
        let block = self.sheet(source_sheet)?.copy_block(source);
        self.sheet_mut(dest_sheet)?.paste_block(dest, &block)
    }

    // ==================== Named Ranges ====================

    /// Define a new workbook-scoped named range
    ///
    /// # Example
    /// ```
    /// use sheetbridge_core::Workbook;
    ///
    /// let mut wb = Workbook::new("Book1.xlsx");
    /// wb.define_name("TaxRate", "=Sheet1!$B$1").unwrap();
    /// ```
    pub fn define_name(&mut self, name: &str, refers_to: &str) -> Result<()> {
        self.named_ranges
            .define(NamedRange::workbook_scope(name, refers_to))
    }

    /// Define a sheet-scoped named range
    pub fn define_name_for_sheet(
        &mut self,
        name: &str,
        refers_to: &str,
        sheet_index: usize,
    ) -> Result<()> {
        self.sheet(sheet_index)?;
        self.named_ranges
            .define(NamedRange::sheet_scope(name, refers_to, sheet_index))
    }

    /// Point a workbook-scoped name at a range, creating or replacing it
    pub fn set_range_name(&mut self, sheet_index: usize, range: &CellRange, name: &str) -> Result<()> {
        let refers_to = NamedRange::reference_to(self.sheet(sheet_index)?.name(), range);
        self.named_ranges
            .define_or_update(NamedRange::workbook_scope(name, refers_to))
    }

    /// Remove a named range from the given scope
    pub fn remove_name(&mut self, name: &str, scope: NameScope) -> Result<NamedRange> {
        self.named_ranges
            .remove(name, &scope)
            .ok_or_else(|| Error::NameNotFound(name.to_string()))
    }

    /// Get the named range collection (read-only)
    pub fn named_ranges(&self) -> &NamedRangeCollection {
        &self.named_ranges
    }

    // ==================== Tables ====================

    /// Add a table on a sheet, naming it `TableN` when no name is given
    pub fn add_table(
        &mut self,
        sheet_index: usize,
        range: CellRange,
        has_headers: bool,
        style: Option<&str>,
        name: Option<&str>,
    ) -> Result<usize> {
        let name = match name {
            Some(name) => {
                self.check_table_name(name, None)?;
                name.to_string()
            }
            None => self.generate_table_name(),
        };
        let mut table = Table::new(name, range, has_headers);
        if let Some(style) = style {
            table.style = style.to_string();
        }
        Ok(self.sheet_mut(sheet_index)?.push_table(table))
    }

    /// Rename a table, keeping names unique across the workbook
    pub fn rename_table(&mut self, sheet_index: usize, table_index: usize, name: &str) -> Result<()> {
        self.sheet(sheet_index)?;
        self.check_table_name(name, Some((sheet_index, table_index)))?;
        self.sheet_mut(sheet_index)?.table_mut(table_index)?.name = name.to_string();
        Ok(())
    }

    fn check_table_name(&self, name: &str, skip: Option<(usize, usize)>) -> Result<()> {
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(Error::InvalidName(format!("'{}' is not a valid table name", name)));
        }
        for (s, ws) in self.worksheets.iter().enumerate() {
            for (t, table) in ws.tables().iter().enumerate() {
                if Some((s, t)) != skip && table.name.eq_ignore_ascii_case(name) {
                    return Err(Error::DuplicateTableName(name.to_string()));
                }
            }
        }
        Ok(())
    }

    fn generate_table_name(&self) -> String {
        let mut n = 1;
        loop {
            let name = format!("Table{}", n);
            if self.check_table_name(&name, None).is_ok() {
                return name;
            }
            n += 1;
        }
    }

    // ==================== Validation ====================

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        self.validate_sheet_name_excluding(name, None)
    }

    fn validate_sheet_name_excluding(
        &self,
        name: &str,
        exclude_index: Option<usize>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        let name_lower = name.to_lowercase();
        for (i, ws) in self.worksheets.iter().enumerate() {
            if Some(i) != exclude_index && ws.name().to_lowercase() == name_lower {
                return Err(Error::DuplicateSheetName(name.into()));
            }
        }

        Ok(())
    }

    fn generate_sheet_name(&self) -> String {
        let mut n = self.worksheets.len() + 1;
        loop {
            let name = format!("Sheet{}", n);
            if self.validate_sheet_name(&name).is_ok() {
                return name;
            }
            n += 1;
        }
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new("Book1")
    }
}

/// Workbook-level settings
#[derive(Debug, Clone, Default)]
pub struct WorkbookSettings {
    /// Date system: false = 1900 (Windows), true = 1904 (Mac)
    pub date_1904: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use pretty_assertions::assert_eq;

    fn sheet_names(wb: &Workbook) -> Vec<String> {
        wb.worksheets().map(|ws| ws.name().to_string()).collect()
    }

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new("Book1.xlsx");
        assert_eq!(wb.name(), "Book1.xlsx");
        assert_eq!(sheet_names(&wb), vec!["Sheet1"]);
        assert_eq!(wb.selection().unwrap().to_a1_string(), "A1");
    }

    #[test]
    fn test_insert_worksheet() {
        let mut wb = Workbook::new("b");
        assert_eq!(wb.insert_worksheet(0, Some("First")).unwrap(), 0);
        assert_eq!(wb.insert_worksheet(99, None).unwrap(), 2);
        assert_eq!(sheet_names(&wb), vec!["First", "Sheet1", "Sheet3"]);
        // Sheet1 stays active even though it moved
        assert_eq!(wb.active_sheet(), 1);
    }

    #[test]
    fn test_duplicate_and_invalid_names() {
        let mut wb = Workbook::new("b");
        assert!(wb.add_worksheet_with_name("SHEET1").is_err());
        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb.add_worksheet_with_name("Sheet/1").is_err());
        assert!(wb
            .add_worksheet_with_name(&"A".repeat(MAX_SHEET_NAME_LEN + 1))
            .is_err());
    }

    #[test]
    fn test_remove_worksheet_keeps_active_sheet() {
        let mut wb = Workbook::new("b");
        wb.add_worksheet_with_name("A").unwrap();
        wb.add_worksheet_with_name("B").unwrap();
        wb.set_active_sheet(2).unwrap();

        wb.remove_worksheet(0).unwrap();
        assert_eq!(wb.active_sheet(), 1);
        assert_eq!(wb.worksheet(wb.active_sheet()).unwrap().name(), "B");

        wb.remove_worksheet(1).unwrap();
        assert_eq!(wb.active_sheet(), 0);
        assert!(wb.remove_worksheet(0).is_err());
    }

    #[test]
    fn test_rename_updates_names() {
        let mut wb = Workbook::new("b");
        let range = CellRange::parse("A1:B2").unwrap();
        wb.set_range_name(0, &range, "Data").unwrap();
        wb.rename_worksheet(0, "Input").unwrap();
        assert_eq!(
            wb.named_ranges().get_exact("Data", &NameScope::Workbook).unwrap().refers_to,
            "=Input!$A$1:$B$2"
        );
    }

    #[test]
    fn test_set_range_name_replaces() {
        let mut wb = Workbook::new("b");
        wb.set_range_name(0, &CellRange::parse("A1").unwrap(), "x").unwrap();
        wb.set_range_name(0, &CellRange::parse("B2").unwrap(), "X").unwrap();
        assert_eq!(wb.named_ranges().len(), 1);
        assert_eq!(wb.named_ranges().iter().next().unwrap().refers_to, "=Sheet1!$B$2");
    }

    #[test]
    fn test_table_names_are_unique() {
        let mut wb = Workbook::new("b");
        wb.add_worksheet_with_name("Other").unwrap();
        let range = CellRange::parse("A1:B3").unwrap();

        wb.add_table(0, range, true, None, None).unwrap();
        wb.add_table(1, range, true, Some("TableStyleLight1"), Some("Sales")).unwrap();
        assert!(wb.add_table(1, range, true, None, Some("table1")).is_err());
        wb.add_table(1, range, false, None, None).unwrap();

        assert_eq!(wb.sheet(1).unwrap().tables()[1].name, "Table2");
        assert_eq!(wb.sheet(1).unwrap().tables()[0].style, "TableStyleLight1");
        assert!(wb.rename_table(1, 0, "Table1").is_err());
        wb.rename_table(1, 0, "Revenue").unwrap();
    }

    #[test]
    fn test_copy_range_between_sheets() {
        let mut wb = Workbook::new("b");
        wb.add_worksheet_with_name("Dest").unwrap();
        wb.sheet_mut(0).unwrap().set_cell_value("A1", 5.0).unwrap();
        wb.copy_range(0, &CellRange::parse("A1").unwrap(), 1, CellAddress::new(2, 2))
            .unwrap();
        assert_eq!(
            wb.sheet(1).unwrap().cell_value("C3").unwrap(),
            &CellValue::Number(5.0)
        );
    }
}
