//! Actions sent back by the backend.
//!
//! On the wire an action is a flat record: an op-code in `func`, positional
//! `args`, and optional target fields. [`Action::decode`] turns one record into
//! a typed [`Action`]; an op-code it does not know is the only place where
//! [`ActionError::Unknown`] can arise.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Value;

/// Errors raised while decoding a wire action.
#[derive(Debug, Error, PartialEq)]
pub enum ActionError {
    #[error("Unknown action: '{0}'")]
    Unknown(String),

    #[error("Invalid argument {index} for '{func}': expected {expected}, got {got}")]
    InvalidArgument {
        func: String,
        index: usize,
        expected: &'static str,
        got: String,
    },

    #[error("'{func}' requires '{field}'")]
    MissingField { func: String, field: &'static str },
}

/// Response body returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub actions: Vec<RawAction>,
}

/// One action exactly as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAction {
    pub func: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub values: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    pub sheet_position: Option<usize>,
    #[serde(default)]
    pub start_row: Option<u32>,
    #[serde(default)]
    pub start_column: Option<u32>,
    #[serde(default)]
    pub row_count: Option<u32>,
    #[serde(default)]
    pub column_count: Option<u32>,
}

/// A rectangular range addressed by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRef {
    pub sheet: usize,
    pub start_row: u32,
    pub start_column: u32,
    pub row_count: u32,
    pub column_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    All,
    Contents,
    Formats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutofitAxis {
    Columns,
    Rows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteShift {
    Up,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertShift {
    Down,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOrigin {
    FormatFromLeftOrAbove,
    FormatFromRightOrBelow,
}

/// Button set of an alert dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buttons {
    Ok,
    OkCancel,
    YesNo,
    YesNoCancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertMode {
    Info,
    Critical,
}

impl Buttons {
    pub fn as_str(&self) -> &'static str {
        match self {
            Buttons::Ok => "ok",
            Buttons::OkCancel => "ok_cancel",
            Buttons::YesNo => "yes_no",
            Buttons::YesNoCancel => "yes_no_cancel",
        }
    }
}

impl AlertMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertMode::Info => "info",
            AlertMode::Critical => "critical",
        }
    }
}

/// A decoded action, one variant per op-code family.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `setValues`
    SetValues {
        range: RangeRef,
        values: Vec<Vec<Value>>,
    },
    /// `rangeClear`, `rangeClearContents` (alias `clearContents`), `rangeClearFormats`
    ClearRange { range: RangeRef, scope: ClearScope },
    /// `addSheet`
    AddSheet {
        position: usize,
        name: Option<String>,
    },
    /// `setSheetName`
    SetSheetName { sheet: usize, name: String },
    /// `sheetDelete`
    DeleteSheet { sheet: usize },
    /// `sheetClear`, `sheetClearContents`, `sheetClearFormats`
    ClearSheet { sheet: usize, scope: ClearScope },
    /// `activateSheet`
    ActivateSheet { sheet: usize },
    /// `setAutofit`
    Autofit { range: RangeRef, axis: AutofitAxis },
    /// `setRangeColor`
    SetRangeColor { range: RangeRef, color: String },
    /// `addHyperlink`
    AddHyperlink {
        range: RangeRef,
        address: String,
        text_to_display: String,
        screen_tip: String,
    },
    /// `setNumberFormat`
    SetNumberFormat { range: RangeRef, format: String },
    /// `setRangeName`
    SetRangeName { range: RangeRef, name: String },
    /// `namesAdd`; a missing sheet means book scope
    AddName {
        sheet: Option<usize>,
        name: String,
        refers_to: String,
    },
    /// `nameDelete`
    DeleteName {
        name: String,
        book_scope: bool,
        scope_sheet: Option<usize>,
    },
    /// `rangeDelete`
    DeleteRange { range: RangeRef, shift: DeleteShift },
    /// `rangeInsert`
    InsertRange {
        range: RangeRef,
        shift: InsertShift,
        copy_origin: Option<CopyOrigin>,
    },
    /// `rangeSelect`
    SelectRange { range: RangeRef },
    /// `copyRange`
    CopyRange {
        source: RangeRef,
        dest_sheet: usize,
        dest_address: String,
    },
    /// `addTable`
    AddTable {
        sheet: usize,
        source_address: String,
        has_headers: bool,
        style: Option<String>,
        name: Option<String>,
    },
    /// `setTableName`
    SetTableName {
        sheet: usize,
        table: usize,
        name: String,
    },
    /// `resizeTable`
    ResizeTable {
        sheet: usize,
        table: usize,
        address: String,
    },
    /// `showAutofilterTable`
    ShowTableAutofilter {
        sheet: usize,
        table: usize,
        show: bool,
    },
    /// `showHeadersTable`
    ShowTableHeaders {
        sheet: usize,
        table: usize,
        show: bool,
    },
    /// `showTotalsTable`
    ShowTableTotals {
        sheet: usize,
        table: usize,
        show: bool,
    },
    /// `setTableStyle`
    SetTableStyle {
        sheet: usize,
        table: usize,
        style: String,
    },
    /// `addPicture`; the image is base64 encoded
    AddPicture {
        sheet: usize,
        image: String,
        column: u32,
        row: u32,
        left: f64,
        top: f64,
    },
    /// `updatePicture`
    UpdatePicture {
        sheet: usize,
        image: String,
        index: usize,
        name: Option<String>,
        width: Option<f64>,
        height: Option<f64>,
    },
    /// `deletePicture`
    DeletePicture { sheet: usize, index: usize },
    /// `setPictureName`
    SetPictureName {
        sheet: usize,
        index: usize,
        name: String,
    },
    /// `setPictureWidth`
    SetPictureWidth {
        sheet: usize,
        index: usize,
        width: f64,
    },
    /// `setPictureHeight`
    SetPictureHeight {
        sheet: usize,
        index: usize,
        height: f64,
    },
    /// `alert`
    Alert {
        prompt: String,
        title: String,
        buttons: Buttons,
        mode: AlertMode,
        callback: Option<String>,
    },
    /// `runMacro`
    RunMacro { name: String, args: Vec<Value> },
}

impl Action {
    /// Decode a wire action.
    pub fn decode(raw: &RawAction) -> Result<Action, ActionError> {
        let action = match raw.func.as_str() {
            "setValues" => Action::SetValues {
                range: raw.range()?,
                values: raw
                    .values
                    .clone()
                    .ok_or_else(|| raw.missing("values"))?,
            },
            "clearContents" | "rangeClearContents" => Action::ClearRange {
                range: raw.range()?,
                scope: ClearScope::Contents,
            },
            "rangeClearFormats" => Action::ClearRange {
                range: raw.range()?,
                scope: ClearScope::Formats,
            },
            "rangeClear" => Action::ClearRange {
                range: raw.range()?,
                scope: ClearScope::All,
            },
            "addSheet" => Action::AddSheet {
                position: raw.index_arg(0)?,
                name: raw.opt_string_arg(1),
            },
            "setSheetName" => Action::SetSheetName {
                sheet: raw.sheet()?,
                name: raw.string_arg(0)?,
            },
            "sheetDelete" => Action::DeleteSheet { sheet: raw.sheet()? },
            "sheetClear" => Action::ClearSheet {
                sheet: raw.sheet()?,
                scope: ClearScope::All,
            },
            "sheetClearContents" => Action::ClearSheet {
                sheet: raw.sheet()?,
                scope: ClearScope::Contents,
            },
            "sheetClearFormats" => Action::ClearSheet {
                sheet: raw.sheet()?,
                scope: ClearScope::Formats,
            },
            "activateSheet" => Action::ActivateSheet {
                sheet: raw.index_arg(0)?,
            },
            "setAutofit" => Action::Autofit {
                range: raw.range()?,
                axis: match raw.string_arg(0)?.as_str() {
                    "columns" => AutofitAxis::Columns,
                    "rows" => AutofitAxis::Rows,
                    _ => return Err(raw.invalid(0, "\"columns\" or \"rows\"")),
                },
            },
            "setRangeColor" => Action::SetRangeColor {
                range: raw.range()?,
                color: raw.string_arg(0)?,
            },
            "addHyperlink" => Action::AddHyperlink {
                range: raw.range()?,
                address: raw.string_arg(0)?,
                text_to_display: raw.string_arg(1)?,
                screen_tip: raw.string_arg(2)?,
            },
            "setNumberFormat" => Action::SetNumberFormat {
                range: raw.range()?,
                format: raw.string_arg(0)?,
            },
            "setRangeName" => Action::SetRangeName {
                range: raw.range()?,
                name: raw.string_arg(0)?,
            },
            "namesAdd" => Action::AddName {
                sheet: raw.sheet_position,
                name: raw.string_arg(0)?,
                refers_to: raw.string_arg(1)?,
            },
            "nameDelete" => {
                let book_scope = raw.bool_arg(4)?;
                Action::DeleteName {
                    name: raw.string_arg(2)?,
                    book_scope,
                    scope_sheet: if book_scope {
                        None
                    } else {
                        Some(raw.index_arg(5)?)
                    },
                }
            }
            "rangeDelete" => Action::DeleteRange {
                range: raw.range()?,
                shift: match raw.string_arg(0)?.as_str() {
                    "up" => DeleteShift::Up,
                    "left" => DeleteShift::Left,
                    _ => return Err(raw.invalid(0, "\"up\" or \"left\"")),
                },
            },
            "rangeInsert" => Action::InsertRange {
                range: raw.range()?,
                shift: match raw.string_arg(0)?.as_str() {
                    "down" => InsertShift::Down,
                    "right" => InsertShift::Right,
                    _ => return Err(raw.invalid(0, "\"down\" or \"right\"")),
                },
                copy_origin: match raw.opt_string_arg(1).as_deref() {
                    None => None,
                    Some("format_from_left_or_above") => Some(CopyOrigin::FormatFromLeftOrAbove),
                    Some("format_from_right_or_below") => Some(CopyOrigin::FormatFromRightOrBelow),
                    Some(_) => return Err(raw.invalid(1, "a copy origin")),
                },
            },
            "rangeSelect" => Action::SelectRange {
                range: raw.range()?,
            },
            "copyRange" => Action::CopyRange {
                source: raw.range()?,
                dest_sheet: raw.index_arg(0)?,
                dest_address: raw.string_arg(1)?,
            },
            "addTable" => Action::AddTable {
                sheet: raw.sheet()?,
                source_address: raw.string_arg(0)?,
                has_headers: raw.bool_arg(1)?,
                style: raw.opt_string_arg(2),
                name: raw.opt_string_arg(3),
            },
            "setTableName" => Action::SetTableName {
                sheet: raw.sheet()?,
                table: raw.index_arg(0)?,
                name: raw.string_arg(1)?,
            },
            "resizeTable" => Action::ResizeTable {
                sheet: raw.sheet()?,
                table: raw.index_arg(0)?,
                address: raw.string_arg(1)?,
            },
            "showAutofilterTable" => Action::ShowTableAutofilter {
                sheet: raw.sheet()?,
                table: raw.index_arg(0)?,
                show: raw.bool_arg(1)?,
            },
            "showHeadersTable" => Action::ShowTableHeaders {
                sheet: raw.sheet()?,
                table: raw.index_arg(0)?,
                show: raw.bool_arg(1)?,
            },
            "showTotalsTable" => Action::ShowTableTotals {
                sheet: raw.sheet()?,
                table: raw.index_arg(0)?,
                show: raw.bool_arg(1)?,
            },
            "setTableStyle" => Action::SetTableStyle {
                sheet: raw.sheet()?,
                table: raw.index_arg(0)?,
                style: raw.string_arg(1)?,
            },
            "addPicture" => Action::AddPicture {
                sheet: raw.sheet()?,
                image: raw.string_arg(0)?,
                column: raw.index_arg(1)? as u32,
                row: raw.index_arg(2)? as u32,
                left: raw.opt_number_arg(3)?.unwrap_or(0.0),
                top: raw.opt_number_arg(4)?.unwrap_or(0.0),
            },
            "updatePicture" => Action::UpdatePicture {
                sheet: raw.sheet()?,
                image: raw.string_arg(0)?,
                index: raw.index_arg(1)?,
                name: raw.opt_string_arg(2),
                width: raw.opt_number_arg(3)?,
                height: raw.opt_number_arg(4)?,
            },
            "deletePicture" => Action::DeletePicture {
                sheet: raw.sheet()?,
                index: raw.index_arg(0)?,
            },
            "setPictureName" => Action::SetPictureName {
                sheet: raw.sheet()?,
                index: raw.index_arg(0)?,
                name: raw.string_arg(1)?,
            },
            "setPictureWidth" => Action::SetPictureWidth {
                sheet: raw.sheet()?,
                index: raw.index_arg(0)?,
                width: raw.number_arg(1)?,
            },
            "setPictureHeight" => Action::SetPictureHeight {
                sheet: raw.sheet()?,
                index: raw.index_arg(0)?,
                height: raw.number_arg(1)?,
            },
            "alert" => Action::Alert {
                prompt: raw.opt_string_arg(0).unwrap_or_default(),
                title: raw.opt_string_arg(1).unwrap_or_default(),
                buttons: match raw.opt_string_arg(2).as_deref() {
                    None | Some("ok") => Buttons::Ok,
                    Some("ok_cancel") => Buttons::OkCancel,
                    Some("yes_no") => Buttons::YesNo,
                    Some("yes_no_cancel") => Buttons::YesNoCancel,
                    Some(_) => return Err(raw.invalid(2, "a button set")),
                },
                mode: match raw.opt_string_arg(3).as_deref() {
                    None | Some("info") => AlertMode::Info,
                    Some("critical") => AlertMode::Critical,
                    Some(_) => return Err(raw.invalid(3, "\"info\" or \"critical\"")),
                },
                callback: raw.opt_string_arg(4),
            },
            "runMacro" => Action::RunMacro {
                name: raw.string_arg(0)?,
                args: raw.args.iter().skip(1).cloned().collect(),
            },
            other => return Err(ActionError::Unknown(other.to_string())),
        };
        Ok(action)
    }
}

impl RawAction {
    /// Create a bare action with positional arguments
    pub fn new(func: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            func: func.into(),
            args,
            ..Default::default()
        }
    }

    /// Target this action at a sheet
    pub fn on_sheet(mut self, sheet: usize) -> Self {
        self.sheet_position = Some(sheet);
        self
    }

    /// Target this action at a range
    pub fn on_range(
        mut self,
        sheet: usize,
        start_row: u32,
        start_column: u32,
        row_count: u32,
        column_count: u32,
    ) -> Self {
        self.sheet_position = Some(sheet);
        self.start_row = Some(start_row);
        self.start_column = Some(start_column);
        self.row_count = Some(row_count);
        self.column_count = Some(column_count);
        self
    }

    /// Attach a values matrix
    pub fn with_values(mut self, values: Vec<Vec<Value>>) -> Self {
        self.values = Some(values);
        self
    }

    fn missing(&self, field: &'static str) -> ActionError {
        ActionError::MissingField {
            func: self.func.clone(),
            field,
        }
    }

    fn invalid(&self, index: usize, expected: &'static str) -> ActionError {
        ActionError::InvalidArgument {
            func: self.func.clone(),
            index,
            expected,
            got: self
                .args
                .get(index)
                .map_or_else(|| "nothing".to_string(), |v| format!("{:?}", v)),
        }
    }

    fn sheet(&self) -> Result<usize, ActionError> {
        self.sheet_position
            .ok_or_else(|| self.missing("sheet_position"))
    }

    fn range(&self) -> Result<RangeRef, ActionError> {
        Ok(RangeRef {
            sheet: self.sheet()?,
            start_row: self.start_row.ok_or_else(|| self.missing("start_row"))?,
            start_column: self
                .start_column
                .ok_or_else(|| self.missing("start_column"))?,
            row_count: self.row_count.ok_or_else(|| self.missing("row_count"))?,
            column_count: self
                .column_count
                .ok_or_else(|| self.missing("column_count"))?,
        })
    }

    fn arg(&self, index: usize) -> &Value {
        static NULL: Value = Value::Null;
        self.args.get(index).unwrap_or(&NULL)
    }

    /// Any non-null argument, stringified
    fn string_arg(&self, index: usize) -> Result<String, ActionError> {
        match self.arg(index) {
            Value::Null => Err(self.invalid(index, "a string")),
            v => Ok(v.to_string()),
        }
    }

    /// `null` and `""` both mean "not given"
    fn opt_string_arg(&self, index: usize) -> Option<String> {
        match self.arg(index) {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            v => Some(v.to_string()),
        }
    }

    /// A non-negative integer, also accepted in string form
    fn index_arg(&self, index: usize) -> Result<usize, ActionError> {
        let n = match self.arg(index) {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match n {
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Ok(n as usize),
            _ => Err(self.invalid(index, "a non-negative integer")),
        }
    }

    fn number_arg(&self, index: usize) -> Result<f64, ActionError> {
        self.opt_number_arg(index)?
            .ok_or_else(|| self.invalid(index, "a number"))
    }

    fn opt_number_arg(&self, index: usize) -> Result<Option<f64>, ActionError> {
        match self.arg(index) {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(Some(*n)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.invalid(index, "a number")),
            Value::Bool(_) => Err(self.invalid(index, "a number")),
        }
    }

    fn bool_arg(&self, index: usize) -> Result<bool, ActionError> {
        match self.arg(index) {
            Value::Bool(b) => Ok(*b),
            Value::Null => Ok(false),
            Value::Number(n) => Ok(*n != 0.0),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" | "" => Ok(false),
                _ => Err(self.invalid(index, "a boolean")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> RawAction {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_decode_set_values() {
        let raw = parse(
            r#"{"func": "setValues", "args": [], "values": [[1, "a"]],
                "sheet_position": 0, "start_row": 2, "start_column": 1,
                "row_count": 1, "column_count": 2}"#,
        );
        assert_eq!(
            Action::decode(&raw).unwrap(),
            Action::SetValues {
                range: RangeRef {
                    sheet: 0,
                    start_row: 2,
                    start_column: 1,
                    row_count: 1,
                    column_count: 2,
                },
                values: vec![vec![Value::Number(1.0), Value::from("a")]],
            }
        );
    }

    #[test]
    fn test_decode_add_sheet_with_null_name() {
        let raw = parse(r#"{"func": "addSheet", "args": [2, null]}"#);
        assert_eq!(
            Action::decode(&raw).unwrap(),
            Action::AddSheet {
                position: 2,
                name: None
            }
        );
    }

    #[test]
    fn test_decode_unknown() {
        let raw = RawAction::new("formatHardDrive", vec![]);
        assert_eq!(
            Action::decode(&raw),
            Err(ActionError::Unknown("formatHardDrive".into()))
        );
    }

    #[test]
    fn test_decode_missing_range() {
        let raw = RawAction::new("rangeSelect", vec![]).on_sheet(0);
        assert_eq!(
            Action::decode(&raw),
            Err(ActionError::MissingField {
                func: "rangeSelect".into(),
                field: "start_row"
            })
        );
    }

    #[test]
    fn test_decode_name_delete_uses_plain_name() {
        let raw = RawAction::new(
            "nameDelete",
            vec![
                "Sheet2!local".into(),
                "=Sheet2!$A$1".into(),
                "local".into(),
                1.into(),
                false.into(),
                1.into(),
            ],
        );
        assert_eq!(
            Action::decode(&raw).unwrap(),
            Action::DeleteName {
                name: "local".into(),
                book_scope: false,
                scope_sheet: Some(1),
            }
        );
    }

    #[test]
    fn test_decode_alert_defaults() {
        let raw = RawAction::new(
            "alert",
            vec!["Hi".into(), "".into(), "".into(), "".into(), "".into()],
        );
        assert_eq!(
            Action::decode(&raw).unwrap(),
            Action::Alert {
                prompt: "Hi".into(),
                title: String::new(),
                buttons: Buttons::Ok,
                mode: AlertMode::Info,
                callback: None,
            }
        );
    }

    #[test]
    fn test_decode_invalid_enum_argument() {
        let raw = RawAction::new("rangeDelete", vec!["sideways".into()]).on_range(0, 0, 0, 1, 1);
        assert!(matches!(
            Action::decode(&raw),
            Err(ActionError::InvalidArgument { index: 0, .. })
        ));
    }

    #[test]
    fn test_decode_numeric_strings() {
        let raw = RawAction::new("activateSheet", vec!["3".into()]);
        assert_eq!(
            Action::decode(&raw).unwrap(),
            Action::ActivateSheet { sheet: 3 }
        );
        let raw = RawAction::new("activateSheet", vec![(-1).into()]);
        assert!(Action::decode(&raw).is_err());
    }

    #[test]
    fn test_decode_run_macro_keeps_rest_args() {
        let raw = RawAction::new("runMacro", vec!["hello".into(), 1.into(), "x".into()]);
        assert_eq!(
            Action::decode(&raw).unwrap(),
            Action::RunMacro {
                name: "hello".into(),
                args: vec![Value::Number(1.0), Value::from("x")],
            }
        );
    }

    #[test]
    fn test_response_defaults() {
        let response: ActionResponse = serde_json::from_str("{}").unwrap();
        assert!(response.actions.is_empty());

        let response: ActionResponse =
            serde_json::from_str(r#"{"actions": [{"func": "rangeSelect", "sheet_position": null}]}"#)
                .unwrap();
        assert_eq!(response.actions[0].sheet_position, None);
    }
}
