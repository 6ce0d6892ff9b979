use serde::{Deserialize, Serialize};

use crate::Value;

/// Request body POSTed to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Name of the client binding (e.g. `"Office.js"`)
    pub client: String,
    pub version: String,
    pub book: BookInfo,
    pub names: Vec<NameInfo>,
    /// Every sheet in workbook order, excluded ones included as placeholders
    pub sheets: Vec<SheetSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInfo {
    pub name: String,
    pub active_sheet_index: usize,
    /// Selected range without sheet prefix, `null` when nothing is selected
    pub selection: Option<String>,
}

/// A defined name that refers to a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameInfo {
    pub name: String,
    /// Sheet the referenced range lives on
    pub sheet_index: usize,
    /// Range address relative to that sheet
    pub address: String,
    pub book_scope: bool,
    /// Owning sheet for sheet-scoped names
    #[serde(default)]
    pub scope_sheet_name: Option<String>,
    #[serde(default)]
    pub scope_sheet_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSnapshot {
    pub name: String,
    /// Used range starting at A1, row-major
    pub values: Vec<Vec<Value>>,
    pub pictures: Vec<PictureInfo>,
    pub tables: Vec<TableInfo>,
}

impl SheetSnapshot {
    /// Placeholder for a sheet left out of the payload.
    ///
    /// The sheet still occupies its position so indices stay aligned.
    pub fn excluded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![vec![]],
            pictures: Vec::new(),
            tables: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PictureInfo {
    pub name: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub range_address: String,
    pub header_row_range_address: Option<String>,
    pub data_body_range_address: String,
    pub total_row_range_address: Option<String>,
    pub show_headers: bool,
    pub show_totals: bool,
    pub table_style: String,
    pub show_autofilter: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_excluded_sheet_shape() {
        let json = serde_json::to_value(SheetSnapshot::excluded("Secret")).unwrap();
        assert_eq!(
            json,
            json!({"name": "Secret", "values": [[]], "pictures": [], "tables": []})
        );
    }

    #[test]
    fn test_book_scoped_name_serializes_null_scope() {
        let name = NameInfo {
            name: "Data".into(),
            sheet_index: 0,
            address: "$A$1:$B$2".into(),
            book_scope: true,
            scope_sheet_name: None,
            scope_sheet_index: None,
        };
        assert_eq!(
            serde_json::to_value(&name).unwrap(),
            json!({
                "name": "Data",
                "sheet_index": 0,
                "address": "$A$1:$B$2",
                "book_scope": true,
                "scope_sheet_name": null,
                "scope_sheet_index": null
            })
        );
    }
}
