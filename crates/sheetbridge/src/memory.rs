//! A host backed by an in-memory [`Workbook`].
//!
//! Used by the command-line tool, where the workbook comes from a JSON
//! document, and by tests. Alerts are recorded instead of shown.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sheetbridge_core::{
    date, parse_reference, quote_sheet_name, CellAddress, CellError, CellFormat, CellRange,
    CellValue, FormatOrigin, Hyperlink, NameScope, NumberFormatCategory, Picture, Shift, Workbook,
    Worksheet,
};
use sheetbridge_protocol::{
    AlertMode, AutofitAxis, Buttons, ClearScope, CopyOrigin, DeleteShift, InsertShift, NameInfo,
    PictureInfo, RangeRef, TableInfo, Value,
};

use crate::error::{Error, Result};
use crate::host::{cell_range, Host, TableFlag};

/// Client name reported by [`MemoryHost`] unless overridden
pub const DEFAULT_CLIENT_NAME: &str = "sheetbridge";

/// An alert the host was asked to show
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub prompt: String,
    pub title: String,
    pub buttons: Buttons,
    pub mode: AlertMode,
}

/// In-memory host.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    workbook: Workbook,
    client_name: String,
    alert_response: Option<String>,
    alerts: Vec<AlertRecord>,
    syncs: usize,
}

impl MemoryHost {
    pub fn new(workbook: Workbook) -> Self {
        Self {
            workbook,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            alert_response: None,
            alerts: Vec::new(),
            syncs: 0,
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Button every alert answers with; defaults to the first button of the set
    pub fn with_alert_response(mut self, button: impl Into<String>) -> Self {
        self.alert_response = Some(button.into());
        self
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    pub fn into_workbook(self) -> Workbook {
        self.workbook
    }

    pub fn alerts(&self) -> &[AlertRecord] {
        &self.alerts
    }

    /// Number of times the bridge asked for a sync
    pub fn sync_count(&self) -> usize {
        self.syncs
    }

    fn sheet(&self, index: usize) -> Result<&Worksheet> {
        Ok(self.workbook.sheet(index)?)
    }

    fn sheet_mut(&mut self, index: usize) -> Result<&mut Worksheet> {
        Ok(self.workbook.sheet_mut(index)?)
    }

    /// The sheet and cell range a range reference points at
    fn target(&mut self, range: &RangeRef) -> Result<(&mut Worksheet, CellRange)> {
        let cells = cell_range(range)?;
        Ok((self.sheet_mut(range.sheet)?, cells))
    }

    /// Cell value as the client would read it, numbers in date formats as dates
    fn read_cell(&self, sheet: &Worksheet, row: u32, col: u16) -> CellValue {
        match sheet.cell_value_at(row, col) {
            CellValue::Number(n) => {
                let category = sheet
                    .cell_format(row, col)
                    .and_then(|f| f.number_format.as_deref())
                    .map(NumberFormatCategory::from_format_code)
                    .unwrap_or(NumberFormatCategory::General);
                date::from_host_number(*n, category, self.workbook.settings().date_1904)
            }
            other => other.clone(),
        }
    }
}

impl Host for MemoryHost {
    fn client_name(&self) -> &str {
        &self.client_name
    }

    fn book_name(&self) -> Result<String> {
        Ok(self.workbook.name().to_string())
    }

    fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self
            .workbook
            .worksheets()
            .map(|ws| ws.name().to_string())
            .collect())
    }

    fn active_sheet_index(&self) -> Result<usize> {
        Ok(self.workbook.active_sheet())
    }

    fn selection(&self) -> Result<Option<String>> {
        let Some(range) = self.workbook.selection() else {
            return Ok(None);
        };
        let sheet = self.sheet(self.workbook.active_sheet())?;
        Ok(Some(format!(
            "{}!{}",
            quote_sheet_name(sheet.name()),
            range.to_a1_string()
        )))
    }

    fn config_region(&self, sheet_name: &str) -> Result<Option<Vec<Vec<CellValue>>>> {
        let Some(sheet) = self.workbook.worksheet_by_name(sheet_name) else {
            return Ok(None);
        };
        let rows = (0..)
            .take_while(|&row| !sheet.cell_value_at(row, 0).is_empty())
            .map(|row| vec![self.read_cell(sheet, row, 0), self.read_cell(sheet, row, 1)])
            .collect();
        Ok(Some(rows))
    }

    fn used_values(&self, sheet: usize) -> Result<Vec<Vec<CellValue>>> {
        let ws = self.sheet(sheet)?;
        let Some(used) = ws.used_range() else {
            return Ok(Vec::new());
        };
        Ok((used.start.row..=used.end.row)
            .map(|row| {
                (used.start.col..=used.end.col)
                    .map(|col| self.read_cell(ws, row, col))
                    .collect()
            })
            .collect())
    }

    fn names(&self) -> Result<Vec<NameInfo>> {
        let names = self.workbook.named_ranges();
        let scoped = (0..self.workbook.sheet_count()).flat_map(move |i| names.sheet_names(i));
        let mut out = Vec::new();
        for named in names.workbook_names().chain(scoped) {
            // Constants and formulas have no address
            let Some((sheet, range)) = named.target() else {
                continue;
            };
            let Some(sheet_index) = self.workbook.sheet_index(&sheet) else {
                continue;
            };
            out.push(NameInfo {
                name: named.name.clone(),
                sheet_index,
                address: format!("{}!{}", quote_sheet_name(&sheet), range.to_absolute_string()),
                book_scope: named.scope == NameScope::Workbook,
                scope_sheet_name: None,
                scope_sheet_index: match named.scope {
                    NameScope::Sheet(i) => Some(i),
                    NameScope::Workbook => None,
                },
            });
        }
        Ok(out)
    }

    fn tables(&self, sheet: usize) -> Result<Vec<TableInfo>> {
        Ok(self
            .sheet(sheet)?
            .tables()
            .iter()
            .map(|t| TableInfo {
                name: t.name.clone(),
                range_address: t.range.to_a1_string(),
                header_row_range_address: t.header_row_range().map(|r| r.to_a1_string()),
                data_body_range_address: t.data_body_range().to_a1_string(),
                total_row_range_address: t.total_row_range().map(|r| r.to_a1_string()),
                show_headers: t.show_headers,
                show_totals: t.show_totals,
                table_style: t.style.clone(),
                show_autofilter: t.show_autofilter,
            })
            .collect())
    }

    fn pictures(&self, sheet: usize) -> Result<Vec<PictureInfo>> {
        Ok(self
            .sheet(sheet)?
            .pictures()
            .iter()
            .map(|p| PictureInfo {
                name: p.name.clone(),
                width: p.width,
                height: p.height,
            })
            .collect())
    }

    fn sync(&mut self) -> Result<()> {
        self.syncs += 1;
        Ok(())
    }

    fn set_values(&mut self, range: &RangeRef, values: Vec<Vec<CellValue>>) -> Result<()> {
        let shape_ok = values.len() == range.row_count as usize
            && values.iter().all(|row| row.len() == range.column_count as usize);
        if !shape_ok {
            return Err(Error::InvalidArgument(format!(
                "values do not fill a {}x{} range",
                range.row_count, range.column_count
            )));
        }
        let (ws, cells) = self.target(range)?;
        ws.set_values(cells.start, values)?;
        Ok(())
    }

    fn clear_range(&mut self, range: &RangeRef, scope: ClearScope) -> Result<()> {
        let (ws, cells) = self.target(range)?;
        match scope {
            ClearScope::All => ws.clear(&cells),
            ClearScope::Contents => ws.clear_contents(&cells),
            ClearScope::Formats => ws.clear_formats(&cells),
        }
        Ok(())
    }

    fn set_range_color(&mut self, range: &RangeRef, color: &str) -> Result<()> {
        let (ws, cells) = self.target(range)?;
        ws.update_formats(&cells, |f| f.fill_color = Some(color.to_string()));
        Ok(())
    }

    fn add_hyperlink(&mut self, range: &RangeRef, hyperlink: Hyperlink) -> Result<()> {
        let (ws, cells) = self.target(range)?;
        if !hyperlink.text_to_display.is_empty() {
            for addr in cells.cells() {
                ws.set_cell_value_at(addr.row, addr.col, hyperlink.text_to_display.as_str())?;
            }
        }
        ws.update_formats(&cells, |f| f.hyperlink = Some(hyperlink.clone()));
        Ok(())
    }

    fn set_number_format(&mut self, range: &RangeRef, format: &str) -> Result<()> {
        let (ws, cells) = self.target(range)?;
        ws.update_formats(&cells, |f| f.number_format = Some(format.to_string()));
        Ok(())
    }

    fn autofit(&mut self, range: &RangeRef, axis: AutofitAxis) -> Result<()> {
        let (ws, cells) = self.target(range)?;
        match axis {
            AutofitAxis::Columns => ws.autofit_columns(&cells),
            AutofitAxis::Rows => ws.autofit_rows(&cells),
        }
        Ok(())
    }

    fn delete_range(&mut self, range: &RangeRef, shift: DeleteShift) -> Result<()> {
        let (ws, cells) = self.target(range)?;
        let shift = match shift {
            DeleteShift::Up => Shift::Up,
            DeleteShift::Left => Shift::Left,
        };
        Ok(ws.delete_range(&cells, shift)?)
    }

    fn insert_range(
        &mut self,
        range: &RangeRef,
        shift: InsertShift,
        copy_origin: Option<CopyOrigin>,
    ) -> Result<()> {
        let (ws, cells) = self.target(range)?;
        let shift = match shift {
            InsertShift::Down => Shift::Down,
            InsertShift::Right => Shift::Right,
        };
        let origin = copy_origin.map(|origin| match origin {
            CopyOrigin::FormatFromLeftOrAbove => FormatOrigin::LeftOrAbove,
            CopyOrigin::FormatFromRightOrBelow => FormatOrigin::RightOrBelow,
        });
        Ok(ws.insert_range(&cells, shift, origin)?)
    }

    fn select_range(&mut self, range: &RangeRef) -> Result<()> {
        let cells = cell_range(range)?;
        Ok(self.workbook.select(range.sheet, cells)?)
    }

    fn copy_range(
        &mut self,
        source: &RangeRef,
        dest_sheet: usize,
        dest_address: &str,
    ) -> Result<()> {
        let cells = cell_range(source)?;
        let (_, dest) = parse_reference(dest_address)?;
        Ok(self
            .workbook
            .copy_range(source.sheet, &cells, dest_sheet, dest.start)?)
    }

    fn add_sheet(&mut self, position: usize, name: Option<&str>) -> Result<()> {
        self.workbook.insert_worksheet(position, name)?;
        Ok(())
    }

    fn set_sheet_name(&mut self, sheet: usize, name: &str) -> Result<()> {
        Ok(self.workbook.rename_worksheet(sheet, name)?)
    }

    fn delete_sheet(&mut self, sheet: usize) -> Result<()> {
        self.workbook.remove_worksheet(sheet)?;
        Ok(())
    }

    fn clear_sheet(&mut self, sheet: usize, scope: ClearScope) -> Result<()> {
        let ws = self.sheet_mut(sheet)?;
        if matches!(scope, ClearScope::All | ClearScope::Contents) {
            ws.clear_all_contents();
        }
        if matches!(scope, ClearScope::All | ClearScope::Formats) {
            ws.clear_all_formats();
        }
        Ok(())
    }

    fn activate_sheet(&mut self, sheet: usize) -> Result<()> {
        Ok(self.workbook.set_active_sheet(sheet)?)
    }

    fn set_range_name(&mut self, range: &RangeRef, name: &str) -> Result<()> {
        let cells = cell_range(range)?;
        Ok(self.workbook.set_range_name(range.sheet, &cells, name)?)
    }

    fn add_name(&mut self, sheet: Option<usize>, name: &str, refers_to: &str) -> Result<()> {
        match sheet {
            Some(sheet) => self.workbook.define_name_for_sheet(name, refers_to, sheet)?,
            None => self.workbook.define_name(name, refers_to)?,
        }
        Ok(())
    }

    fn delete_name(&mut self, name: &str, scope: NameScope) -> Result<()> {
        self.workbook.remove_name(name, scope)?;
        Ok(())
    }

    fn add_table(
        &mut self,
        sheet: usize,
        source_address: &str,
        has_headers: bool,
        style: Option<&str>,
        name: Option<&str>,
    ) -> Result<()> {
        let (_, range) = parse_reference(source_address)?;
        self.workbook
            .add_table(sheet, range, has_headers, style, name)?;
        Ok(())
    }

    fn set_table_name(&mut self, sheet: usize, table: usize, name: &str) -> Result<()> {
        Ok(self.workbook.rename_table(sheet, table, name)?)
    }

    fn resize_table(&mut self, sheet: usize, table: usize, address: &str) -> Result<()> {
        let (_, range) = parse_reference(address)?;
        self.sheet_mut(sheet)?.table_mut(table)?.range = range;
        Ok(())
    }

    fn set_table_flag(
        &mut self,
        sheet: usize,
        table: usize,
        flag: TableFlag,
        show: bool,
    ) -> Result<()> {
        let table = self.sheet_mut(sheet)?.table_mut(table)?;
        match flag {
            TableFlag::Headers => table.show_headers = show,
            TableFlag::Totals => table.set_show_totals(show),
            TableFlag::Autofilter => table.show_autofilter = show,
        }
        Ok(())
    }

    fn set_table_style(&mut self, sheet: usize, table: usize, style: &str) -> Result<()> {
        self.sheet_mut(sheet)?.table_mut(table)?.style = style.to_string();
        Ok(())
    }

    fn add_picture(
        &mut self,
        sheet: usize,
        image: Vec<u8>,
        anchor: CellAddress,
        left: f64,
        top: f64,
    ) -> Result<()> {
        let mut picture = Picture::new("", image, anchor);
        picture.left = left;
        picture.top = top;
        self.sheet_mut(sheet)?.add_picture(picture);
        Ok(())
    }

    fn update_picture(
        &mut self,
        sheet: usize,
        index: usize,
        image: Vec<u8>,
        name: Option<&str>,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<()> {
        let picture = self.sheet_mut(sheet)?.picture_mut(index)?;
        picture.image = image;
        if let Some(name) = name {
            picture.name = name.to_string();
        }
        if let Some(width) = width {
            picture.width = width;
        }
        if let Some(height) = height {
            picture.height = height;
        }
        Ok(())
    }

    fn delete_picture(&mut self, sheet: usize, index: usize) -> Result<()> {
        self.sheet_mut(sheet)?.remove_picture(index)?;
        Ok(())
    }

    fn set_picture_name(&mut self, sheet: usize, index: usize, name: &str) -> Result<()> {
        self.sheet_mut(sheet)?.picture_mut(index)?.name = name.to_string();
        Ok(())
    }

    fn set_picture_size(
        &mut self,
        sheet: usize,
        index: usize,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<()> {
        let picture = self.sheet_mut(sheet)?.picture_mut(index)?;
        if let Some(width) = width {
            picture.width = width;
        }
        if let Some(height) = height {
            picture.height = height;
        }
        Ok(())
    }

    fn alert(
        &mut self,
        prompt: &str,
        title: &str,
        buttons: Buttons,
        mode: AlertMode,
    ) -> Result<Option<String>> {
        self.alerts.push(AlertRecord {
            prompt: prompt.to_string(),
            title: title.to_string(),
            buttons,
            mode,
        });
        let pressed = self.alert_response.clone().unwrap_or_else(|| {
            match buttons {
                Buttons::Ok | Buttons::OkCancel => "ok",
                Buttons::YesNo | Buttons::YesNoCancel => "yes",
            }
            .to_string()
        });
        Ok(Some(pressed))
    }
}

// ==================== JSON documents ====================

/// A workbook as a JSON document, the file format of the command-line tool.
///
/// Cell values are a row-major matrix from A1. Strings in ISO-8601 form load
/// as dates, error codes such as `#N/A` as errors and `""` as empty cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookDocument {
    pub name: String,
    #[serde(default)]
    pub active_sheet: usize,
    /// A1 range on the active sheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub date_1904: bool,
    pub sheets: Vec<SheetDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<NameDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetDocument {
    pub name: String,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
    /// Cell formats keyed by A1 address
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub formats: BTreeMap<String, FormatDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pictures: Vec<PictureDocument>,
    /// Column letters fitted to their content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub autofit_columns: Vec<String>,
    /// 1-based row numbers fitted to their content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub autofit_rows: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<HyperlinkDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperlinkDocument {
    pub address: String,
    #[serde(default)]
    pub text_to_display: String,
    #[serde(default)]
    pub screen_tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDocument {
    pub name: String,
    /// Full A1 range including header and total rows
    pub range: String,
    #[serde(default = "default_true")]
    pub show_headers: bool,
    #[serde(default)]
    pub show_totals: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_autofilter: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PictureDocument {
    pub name: String,
    /// Top-left cell, A1
    pub anchor: String,
    /// Base64 image bytes
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameDocument {
    pub name: String,
    /// Reference such as `=Sheet1!$A$1:$B$2`
    pub refers_to: String,
    /// Owning sheet for sheet-scoped names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_sheet: Option<String>,
}

fn default_true() -> bool {
    true
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn cell_from_document(value: &Value) -> CellValue {
    match value {
        Value::String(s) if s.is_empty() => CellValue::Empty,
        Value::String(s) => match CellError::parse(s) {
            Some(err) => CellValue::Error(err),
            None => value.to_cell_value(),
        },
        other => other.to_cell_value(),
    }
}

impl MemoryHost {
    /// Load a host from a JSON document
    pub fn from_document(doc: &BookDocument) -> Result<Self> {
        let mut workbook = Workbook::empty(doc.name.as_str());
        workbook.settings_mut().date_1904 = doc.date_1904;

        for sheet in &doc.sheets {
            let mut ws = Worksheet::new(sheet.name.as_str());
            let rows = sheet
                .values
                .iter()
                .map(|row| row.iter().map(cell_from_document).collect())
                .collect();
            ws.set_values(CellAddress::new(0, 0), rows)?;

            for (address, format) in &sheet.formats {
                let range = CellRange::parse(address)?;
                ws.update_formats(&range, |f| {
                    *f = CellFormat {
                        fill_color: format.fill_color.clone(),
                        number_format: format.number_format.clone(),
                        hyperlink: format.hyperlink.as_ref().map(|h| Hyperlink {
                            address: h.address.clone(),
                            text_to_display: h.text_to_display.clone(),
                            screen_tip: h.screen_tip.clone(),
                        }),
                    }
                });
            }

            for pic in &sheet.pictures {
                let image = BASE64
                    .decode(pic.image.trim())
                    .map_err(|e| Error::InvalidArgument(format!("picture '{}': {}", pic.name, e)))?;
                let mut picture = Picture::new(pic.name.as_str(), image, CellAddress::parse(&pic.anchor)?);
                picture.left = pic.left;
                picture.top = pic.top;
                if let Some(width) = pic.width {
                    picture.width = width;
                }
                if let Some(height) = pic.height {
                    picture.height = height;
                }
                ws.add_picture(picture);
            }

            for letters in &sheet.autofit_columns {
                let col = CellAddress::letters_to_column(letters)?;
                ws.autofit_columns(&CellRange::from_indices(0, col, 0, col));
            }
            for &row in &sheet.autofit_rows {
                let row = row.checked_sub(1).ok_or_else(|| {
                    Error::InvalidArgument("autofit rows are numbered from 1".to_string())
                })?;
                ws.autofit_rows(&CellRange::from_indices(row, 0, row, 0));
            }
            workbook.add_existing_worksheet(ws)?;
        }

        // Tables need the workbook for name uniqueness
        for (index, sheet) in doc.sheets.iter().enumerate() {
            for table in &sheet.tables {
                let range = CellRange::parse(&table.range)?;
                let t = workbook.add_table(
                    index,
                    range,
                    table.show_headers,
                    table.style.as_deref(),
                    Some(&table.name),
                )?;
                let t = workbook.sheet_mut(index)?.table_mut(t)?;
                t.show_totals = table.show_totals;
                if let Some(show) = table.show_autofilter {
                    t.show_autofilter = show;
                }
            }
        }

        for name in &doc.names {
            match &name.scope_sheet {
                Some(sheet) => {
                    let index = workbook
                        .sheet_index(sheet)
                        .ok_or_else(|| sheetbridge_core::Error::SheetNotFound(sheet.clone()))?;
                    workbook.define_name_for_sheet(&name.name, &name.refers_to, index)?;
                }
                None => workbook.define_name(&name.name, &name.refers_to)?,
            }
        }

        if !workbook.is_empty() {
            workbook.set_active_sheet(doc.active_sheet)?;
            if let Some(selection) = &doc.selection {
                let (_, range) = parse_reference(selection)?;
                workbook.select(doc.active_sheet, range)?;
            }
        }
        Ok(Self::new(workbook))
    }

    /// Write the workbook back out as a JSON document
    pub fn to_document(&self) -> BookDocument {
        let wb = &self.workbook;
        let sheet_names: Vec<String> = wb.worksheets().map(|ws| ws.name().to_string()).collect();

        let sheets = wb
            .worksheets()
            .map(|ws| SheetDocument {
                name: ws.name().to_string(),
                values: ws
                    .used_range()
                    .map(|range| {
                        ws.values_in(&range)
                            .iter()
                            .map(|row| row.iter().map(Value::from).collect())
                            .collect()
                    })
                    .unwrap_or_default(),
                formats: ws
                    .formatted_cells()
                    .map(|(addr, f)| {
                        let doc = FormatDocument {
                            fill_color: f.fill_color.clone(),
                            number_format: f.number_format.clone(),
                            hyperlink: f.hyperlink.as_ref().map(|h| HyperlinkDocument {
                                address: h.address.clone(),
                                text_to_display: h.text_to_display.clone(),
                                screen_tip: h.screen_tip.clone(),
                            }),
                        };
                        (addr.to_a1_string(), doc)
                    })
                    .collect(),
                tables: ws
                    .tables()
                    .iter()
                    .map(|t| TableDocument {
                        name: t.name.clone(),
                        range: t.range.to_a1_string(),
                        show_headers: t.show_headers,
                        show_totals: t.show_totals,
                        style: Some(t.style.clone()),
                        show_autofilter: Some(t.show_autofilter),
                    })
                    .collect(),
                pictures: ws
                    .pictures()
                    .iter()
                    .map(|p| PictureDocument {
                        name: p.name.clone(),
                        anchor: p.anchor.to_a1_string(),
                        image: BASE64.encode(&p.image),
                        left: p.left,
                        top: p.top,
                        width: Some(p.width),
                        height: Some(p.height),
                    })
                    .collect(),
                autofit_columns: ws
                    .autofitted_columns()
                    .map(CellAddress::column_to_letters)
                    .collect(),
                autofit_rows: ws.autofitted_rows().map(|row| row + 1).collect(),
            })
            .collect();

        let names = wb
            .named_ranges()
            .iter()
            .map(|n| NameDocument {
                name: n.name.clone(),
                refers_to: n.refers_to.clone(),
                scope_sheet: match n.scope {
                    NameScope::Sheet(i) => sheet_names.get(i).cloned(),
                    NameScope::Workbook => None,
                },
            })
            .collect();

        BookDocument {
            name: wb.name().to_string(),
            active_sheet: wb.active_sheet(),
            selection: wb.selection().map(|r| r.to_a1_string()),
            date_1904: wb.settings().date_1904,
            sheets,
            names,
        }
    }
}
