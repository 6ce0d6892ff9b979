//! Snapshot of the workbook sent to the backend.

use sheetbridge_core::strip_sheet_prefix;
use sheetbridge_protocol::{BookInfo, NameInfo, Payload, SheetSnapshot, TableInfo, Value};
use tracing::debug;

use crate::error::Result;
use crate::host::Host;

/// Build the request payload.
///
/// Sheets named in `exclude` keep their position but carry no data. Every
/// address in the payload is relative to its sheet.
pub fn build_payload(
    host: &dyn Host,
    exclude: &[String],
    client: &str,
    version: &str,
) -> Result<Payload> {
    let sheet_names = host.sheet_names()?;

    let book = BookInfo {
        name: host.book_name()?,
        active_sheet_index: host.active_sheet_index()?,
        selection: host
            .selection()?
            .map(|address| strip_sheet_prefix(&address).to_string()),
    };

    let names = host
        .names()?
        .into_iter()
        .map(|name| normalize_name(name, &sheet_names))
        .collect();

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for (index, name) in sheet_names.iter().enumerate() {
        if exclude.contains(name) {
            debug!(sheet = %name, "sheet excluded from payload");
            sheets.push(SheetSnapshot::excluded(name.as_str()));
            continue;
        }
        sheets.push(SheetSnapshot {
            name: name.clone(),
            values: sheet_values(host, index)?,
            pictures: host.pictures(index)?,
            tables: host
                .tables(index)?
                .into_iter()
                .map(normalize_table)
                .collect(),
        });
    }

    Ok(Payload {
        client: client.to_string(),
        version: version.to_string(),
        book,
        names,
        sheets,
    })
}

/// Used values, with an empty sheet sent as a single empty cell
fn sheet_values(host: &dyn Host, sheet: usize) -> Result<Vec<Vec<Value>>> {
    let values: Vec<Vec<Value>> = host
        .used_values(sheet)?
        .iter()
        .map(|row| row.iter().map(Value::from).collect())
        .collect();
    if values.iter().all(Vec::is_empty) {
        return Ok(vec![vec![Value::from("")]]);
    }
    Ok(values)
}

fn normalize_name(mut name: NameInfo, sheet_names: &[String]) -> NameInfo {
    name.address = strip_sheet_prefix(&name.address).to_string();
    if name.book_scope {
        name.scope_sheet_name = None;
        name.scope_sheet_index = None;
    } else if name.scope_sheet_name.is_none() {
        name.scope_sheet_name = name
            .scope_sheet_index
            .and_then(|i| sheet_names.get(i))
            .cloned();
    }
    name
}

fn normalize_table(mut table: TableInfo) -> TableInfo {
    let strip = |address: &str| strip_sheet_prefix(address).to_string();
    table.range_address = strip(&table.range_address);
    table.data_body_range_address = strip(&table.data_body_range_address);
    table.header_row_range_address = table.header_row_range_address.as_deref().map(strip);
    table.total_row_range_address = table.total_row_range_address.as_deref().map(strip);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{BookDocument, MemoryHost};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn book() -> MemoryHost {
        let doc: BookDocument = serde_json::from_value(json!({
            "name": "Book1.xlsx",
            "selection": "B2:C3",
            "sheets": [
                {
                    "name": "My Data",
                    "values": [["region", "sales"], ["north", 10]],
                    "tables": [{"name": "Sales", "range": "A1:B2"}]
                },
                {
                    "name": "Secret",
                    "values": [["key"], ["hunter2"]],
                    "tables": [{"name": "Keys", "range": "A1:A2"}],
                    "pictures": [{"name": "Badge", "anchor": "C1", "image": "aGk="}]
                }
            ],
            "names": [
                {"name": "Total", "refers_to": "='My Data'!$B$2"},
                {"name": "Local", "refers_to": "=Secret!$A$1:$A$2", "scope_sheet": "Secret"}
            ]
        }))
        .unwrap();
        MemoryHost::from_document(&doc).unwrap()
    }

    #[test]
    fn test_addresses_lose_sheet_prefix() {
        let host = book();
        assert_eq!(host.selection().unwrap().as_deref(), Some("'My Data'!B2:C3"));

        let payload = build_payload(&host, &[], "sheetbridge", "0.1.0").unwrap();
        assert_eq!(payload.book.selection.as_deref(), Some("B2:C3"));
        assert_eq!(payload.names[0].address, "$B$2");
        assert_eq!(payload.names[1].address, "$A$1:$A$2");
        assert_eq!(payload.sheets[0].tables[0].range_address, "A1:B2");
    }

    #[test]
    fn test_name_scopes() {
        let payload = build_payload(&book(), &[], "sheetbridge", "0.1.0").unwrap();
        let book_name = &payload.names[0];
        assert!(book_name.book_scope);
        assert_eq!(book_name.sheet_index, 0);
        assert_eq!(book_name.scope_sheet_name, None);
        assert_eq!(book_name.scope_sheet_index, None);

        let sheet_name = &payload.names[1];
        assert_eq!(sheet_name.name, "Local");
        assert!(!sheet_name.book_scope);
        assert_eq!(sheet_name.sheet_index, 1);
        assert_eq!(sheet_name.scope_sheet_name.as_deref(), Some("Secret"));
        assert_eq!(sheet_name.scope_sheet_index, Some(1));
    }

    #[test]
    fn test_excluded_sheet_drops_tables_and_pictures() {
        let host = book();
        let payload = build_payload(&host, &["Secret".to_string()], "sheetbridge", "0.1.0").unwrap();
        assert_eq!(payload.sheets.len(), 2);

        let secret = &payload.sheets[1];
        assert_eq!(secret.name, "Secret");
        assert_eq!(secret.values, vec![Vec::<Value>::new()]);
        assert!(secret.tables.is_empty());
        assert!(secret.pictures.is_empty());

        // Sheet-scoped names survive; only sheet contents are withheld
        assert_eq!(payload.names.len(), 2);
        assert_eq!(payload.sheets[0].tables.len(), 1);
        assert_eq!(host.pictures(1).unwrap().len(), 1);
    }

    #[test]
    fn test_table_addresses_are_stripped() {
        let table = TableInfo {
            name: "Sales".into(),
            range_address: "'My Data'!$A$1:$B$4".into(),
            header_row_range_address: Some("'My Data'!$A$1:$B$1".into()),
            data_body_range_address: "'My Data'!$A$2:$B$3".into(),
            total_row_range_address: Some("'My Data'!$A$4:$B$4".into()),
            show_headers: true,
            show_totals: true,
            table_style: "TableStyleMedium2".into(),
            show_autofilter: true,
        };
        let table = normalize_table(table);
        assert_eq!(table.range_address, "$A$1:$B$4");
        assert_eq!(table.header_row_range_address.as_deref(), Some("$A$1:$B$1"));
        assert_eq!(table.data_body_range_address, "$A$2:$B$3");
        assert_eq!(table.total_row_range_address.as_deref(), Some("$A$4:$B$4"));
    }

    #[test]
    fn test_scope_name_filled_from_index() {
        let name = NameInfo {
            name: "Local".into(),
            sheet_index: 1,
            address: "Secret!$A$1".into(),
            book_scope: false,
            scope_sheet_name: None,
            scope_sheet_index: Some(1),
        };
        let sheets = vec!["Data".to_string(), "Secret".to_string()];
        let name = normalize_name(name, &sheets);
        assert_eq!(name.address, "$A$1");
        assert_eq!(name.scope_sheet_name.as_deref(), Some("Secret"));
    }
}
