//! End-to-end tests for a full run: config -> payload -> backend -> actions

use std::cell::RefCell;

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use sheetbridge::config::Headers;
use sheetbridge::prelude::*;
use sheetbridge::{ActionResponse, BookDocument, Callbacks, Payload, RawAction, Transport};
use sheetbridge_protocol::{AlertMode, Buttons};

/// Transport that records payloads and answers with a fixed response
#[derive(Default)]
struct Recording {
    sent: RefCell<Vec<(String, Headers, Payload)>>,
    response: ActionResponse,
}

impl Recording {
    fn answering(actions: Vec<RawAction>) -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            response: ActionResponse { actions },
        }
    }

    fn payload(&self) -> Payload {
        self.sent.borrow()[0].2.clone()
    }
}

impl Transport for Recording {
    fn post(&self, url: &str, headers: &Headers, payload: &Payload) -> sheetbridge::Result<ActionResponse> {
        self.sent
            .borrow_mut()
            .push((url.to_string(), headers.clone(), payload.clone()));
        Ok(self.response.clone())
    }
}

fn host(doc: serde_json::Value) -> MemoryHost {
    let doc: BookDocument = serde_json::from_value(doc).unwrap();
    MemoryHost::from_document(&doc).unwrap()
}

fn three_sheets() -> MemoryHost {
    host(json!({
        "name": "Book1.xlsx",
        "sheets": [
            {"name": "A", "values": [[1, 2]]},
            {"name": "B", "values": [["secret"]]},
            {"name": "C", "values": []}
        ]
    }))
}

fn options() -> RunOptions {
    RunOptions::new().url("http://backend.test/run")
}

#[test]
fn test_add_sheet_then_write_to_it() {
    let mut host = host(json!({
        "name": "Book1.xlsx",
        "sheets": [{"name": "Sheet1", "values": [["x"]]}]
    }));
    let transport = Recording::answering(vec![
        RawAction::new("addSheet", vec![0.into(), "Report".into()]),
        RawAction::new("setValues", vec![])
            .on_range(0, 0, 0, 1, 2)
            .with_values(vec![vec![Value::from("total"), Value::Number(42.0)]]),
    ]);
    let client = Client::with_transport(ClientConfig::default(), &transport);

    let summary = client.run(&mut host, &options()).unwrap();
    assert_eq!(summary.actions_applied, 2);

    let wb = host.workbook();
    assert_eq!(wb.sheet(0).unwrap().name(), "Report");
    assert_eq!(
        wb.sheet(0).unwrap().cell_value("B1").unwrap(),
        &CellValue::Number(42.0)
    );
    assert_eq!(
        wb.sheet(1).unwrap().cell_value("A1").unwrap(),
        &CellValue::from("x")
    );
    // addSheet forces a sync, setValues does not
    assert_eq!(host.sync_count(), 1);
}

#[test]
fn test_payload_shape() {
    let mut host = three_sheets();
    let transport = Recording::answering(vec![]);
    let client = Client::with_transport(ClientConfig::default(), &transport);
    client.run(&mut host, &options()).unwrap();

    let payload = serde_json::to_value(transport.payload()).unwrap();
    assert_eq!(payload["client"], json!("sheetbridge"));
    assert_eq!(payload["book"]["name"], json!("Book1.xlsx"));
    assert_eq!(payload["book"]["active_sheet_index"], json!(0));
    assert_eq!(payload["sheets"][0]["values"], json!([[1.0, 2.0]]));
    // An empty sheet is a single empty cell
    assert_eq!(payload["sheets"][2]["values"], json!([[""]]));
}

#[test]
fn test_include_from_config_sheet_excludes_the_rest() {
    let mut host = host(json!({
        "name": "Book1.xlsx",
        "sheets": [
            {"name": "A", "values": [[1]]},
            {"name": "B", "values": [[2]]},
            {"name": "xlwings.conf", "values": [["INCLUDE", "A"], ["URL", "http://from-sheet.test"]]}
        ]
    }));
    let transport = Recording::answering(vec![]);
    let client = Client::with_transport(ClientConfig::default(), &transport);
    client.run(&mut host, &RunOptions::new()).unwrap();

    let (url, _, payload) = transport.sent.borrow()[0].clone();
    assert_eq!(url, "http://from-sheet.test");
    let names: Vec<_> = payload.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "xlwings.conf"]);
    assert_eq!(payload.sheets[0].values, vec![vec![Value::Number(1.0)]]);
    assert_eq!(payload.sheets[1].values, vec![Vec::<Value>::new()]);
    assert_eq!(payload.sheets[2].values, vec![Vec::<Value>::new()]);
}

#[test]
fn test_conflict_fails_before_any_request() {
    let mut host = three_sheets();
    let transport = Recording::answering(vec![]);
    let client = Client::with_transport(ClientConfig::default(), &transport);

    let err = client
        .run(&mut host, &options().include("A").exclude("B"))
        .unwrap_err();
    assert!(matches!(err, Error::ConfigConflict));
    assert_eq!(
        err.to_string(),
        "Either use 'include' or 'exclude', but not both!"
    );
    assert!(transport.sent.borrow().is_empty());
}

#[test]
fn test_missing_url_fails_before_any_request() {
    let mut host = three_sheets();
    let transport = Recording::answering(vec![]);
    let client = Client::with_transport(ClientConfig::default(), &transport);

    assert!(matches!(
        client.run(&mut host, &RunOptions::new()),
        Err(Error::InvalidArgument(_))
    ));
    assert!(transport.sent.borrow().is_empty());
}

#[test]
fn test_unknown_action_stops_the_batch() {
    let mut host = three_sheets();
    let write = |text: &str| {
        RawAction::new("setValues", vec![])
            .on_range(0, 0, 0, 1, 1)
            .with_values(vec![vec![Value::from(text)]])
    };
    let transport = Recording::answering(vec![
        write("first"),
        RawAction::new("formatHardDrive", vec![]),
        write("never"),
    ]);
    let client = Client::with_transport(ClientConfig::default(), &transport);

    let err = client.run(&mut host, &options()).unwrap_err();
    assert!(matches!(err, Error::UnknownAction(ref f) if f == "formatHardDrive"));
    assert_eq!(
        host.workbook().sheet(0).unwrap().cell_value("A1").unwrap(),
        &CellValue::from("first")
    );
}

#[test]
fn test_iso_strings_become_dates_and_go_back_out_as_iso() {
    let mut host = three_sheets();
    let transport = Recording::answering(vec![RawAction::new("setValues", vec![])
        .on_range(2, 0, 0, 1, 2)
        .with_values(vec![vec![
            Value::from("2023-01-15T06:00:00"),
            Value::from("Total revenue in T1"),
        ]])]);
    let client = Client::with_transport(ClientConfig::default(), &transport);
    client.run(&mut host, &options()).unwrap();

    let sheet = host.workbook().sheet(2).unwrap();
    assert!(matches!(
        sheet.cell_value("A1").unwrap(),
        CellValue::DateTime(_)
    ));
    assert_eq!(
        sheet.cell_value("B1").unwrap(),
        &CellValue::from("Total revenue in T1")
    );

    let payload = build_payload(&host, &[], "test", "0").unwrap();
    assert_eq!(
        payload.sheets[2].values[0],
        vec![
            Value::from("2023-01-15T06:00:00.000"),
            Value::from("Total revenue in T1")
        ]
    );
}

#[test]
fn test_run_macro_prefers_callbacks_then_builtins() {
    let mut host = three_sheets();
    let callbacks = Callbacks::new().with("stamp", |host: &mut dyn Host, args: &[Value]| {
        let _ = host.sheet_names()?;
        assert_eq!(args, &[Value::from("hello")]);
        host.set_sheet_name(0, "Stamped")
    });
    let transport = Recording::answering(vec![
        RawAction::new("runMacro", vec!["stamp".into(), "hello".into()]),
        RawAction::new("runMacro", vec!["activateSheet".into(), 2.into()]),
        RawAction::new("runMacro", vec!["nope".into()]),
    ]);
    let client =
        Client::with_transport(ClientConfig::default(), &transport).with_callbacks(callbacks);

    let err = client.run(&mut host, &options()).unwrap_err();
    assert!(matches!(err, Error::MissingCallback(ref name) if name == "nope"));
    assert_eq!(host.workbook().sheet(0).unwrap().name(), "Stamped");
    assert_eq!(host.workbook().active_sheet(), 2);
    // activateSheet goes through a sync
    assert_eq!(host.sync_count(), 1);
}

#[test]
fn test_alert_passes_the_pressed_button_to_its_callback() {
    let mut host = three_sheets().with_alert_response("no");
    let callbacks = Callbacks::new().with("answer", |host: &mut dyn Host, args: &[Value]| {
        let name = format!("answer-{}", args[0]);
        host.set_sheet_name(2, &name)
    });
    let transport = Recording::answering(vec![RawAction::new(
        "alert",
        vec![
            "Proceed?".into(),
            "Question".into(),
            "yes_no".into(),
            "".into(),
            "answer".into(),
        ],
    )]);
    let client =
        Client::with_transport(ClientConfig::default(), &transport).with_callbacks(callbacks);
    client.run(&mut host, &options()).unwrap();

    assert_eq!(host.alerts()[0].buttons, Buttons::YesNo);
    assert_eq!(host.alerts()[0].mode, AlertMode::Info);
    assert_eq!(host.workbook().sheet(2).unwrap().name(), "answer-no");
}

#[test]
fn test_http_round_trip_sends_headers() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/hello")
            .header("content-type", "application/json")
            .header("authorization", "sheet-token")
            .header("x-team", "quant");
        then.status(200).json_body(json!({
            "actions": [{"func": "activateSheet", "args": [1]}]
        }));
    });

    let mut host = host(json!({
        "name": "Book1.xlsx",
        "sheets": [
            {"name": "Data", "values": [[1]]},
            {"name": "xlwings.conf", "values": [["AUTH", "sheet-token"], ["header_X-Team", "quant"]]}
        ]
    }));
    let client = Client::new(ClientConfig::default()).unwrap();
    let options = RunOptions::new().url(server.url("/hello"));
    let summary = client.run(&mut host, &options).unwrap();

    mock.assert_hits(1);
    assert_eq!(summary.actions_applied, 1);
    assert_eq!(host.workbook().active_sheet(), 1);
}

#[test]
fn test_http_null_body_means_no_actions() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/noop");
        then.status(200).body("null");
    });

    let mut host = three_sheets();
    let client = Client::new(ClientConfig::default()).unwrap();
    let summary = client
        .run(&mut host, &RunOptions::new().url(server.url("/noop")))
        .unwrap();
    assert_eq!(summary.actions_applied, 0);
}

#[test]
fn test_http_error_body_is_reported_as_critical_alert() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/fail");
        then.status(500).body("boom");
    });

    let mut host = three_sheets();
    let client = Client::new(ClientConfig::default()).unwrap();
    let err = client
        .run_and_report(&mut host, &RunOptions::new().url(server.url("/fail")))
        .unwrap_err();

    assert!(matches!(err, Error::Remote { status: 500, .. }));
    assert_eq!(err.to_string(), "boom");
    let alert = &host.alerts()[0];
    assert_eq!(alert.prompt, "boom");
    assert_eq!(alert.title, "Error");
    assert_eq!(alert.buttons, Buttons::Ok);
    assert_eq!(alert.mode, AlertMode::Critical);
}

/// Run once against a backend answering with `actions`, returning how many ran
fn replay(host: &mut MemoryHost, actions: Vec<RawAction>) -> usize {
    let transport = Recording::answering(actions);
    let client = Client::with_transport(ClientConfig::default(), &transport);
    client.run(host, &options()).unwrap().actions_applied
}

#[test]
fn test_table_actions() {
    let mut host = host(json!({
        "name": "Book1.xlsx",
        "sheets": [{"name": "Sales", "values": [["region", "sales"], ["north", 10], ["south", 20]]}]
    }));
    let applied = replay(
        &mut host,
        vec![
            RawAction::new(
                "addTable",
                vec!["A1:B3".into(), true.into(), "TableStyleLight9".into(), "Regions".into()],
            )
            .on_sheet(0),
            RawAction::new("setTableName", vec![0.into(), "Territories".into()]).on_sheet(0),
            RawAction::new("resizeTable", vec![0.into(), "A1:B4".into()]).on_sheet(0),
            RawAction::new("showTotalsTable", vec![0.into(), true.into()]).on_sheet(0),
            RawAction::new("showAutofilterTable", vec![0.into(), false.into()]).on_sheet(0),
            RawAction::new("setTableStyle", vec![0.into(), "TableStyleDark1".into()]).on_sheet(0),
        ],
    );
    assert_eq!(applied, 6);
    // Every table action forces a sync
    assert_eq!(host.sync_count(), 6);

    let tables = host.tables(0).unwrap();
    assert_eq!(tables.len(), 1);
    let table = &tables[0];
    assert_eq!(table.name, "Territories");
    assert_eq!(table.range_address, "A1:B5");
    assert_eq!(table.header_row_range_address.as_deref(), Some("A1:B1"));
    assert_eq!(table.data_body_range_address, "A2:B4");
    assert_eq!(table.total_row_range_address.as_deref(), Some("A5:B5"));
    assert!(table.show_totals);
    assert!(!table.show_autofilter);
    assert_eq!(table.table_style, "TableStyleDark1");
}

#[test]
fn test_picture_actions() {
    let mut host = host(json!({
        "name": "Book1.xlsx",
        "sheets": [{"name": "Sheet1", "values": []}]
    }));
    replay(
        &mut host,
        vec![
            RawAction::new(
                "addPicture",
                vec!["aGk=".into(), 2.into(), 1.into(), 5.0.into(), 6.0.into()],
            )
            .on_sheet(0),
            RawAction::new("addPicture", vec!["aGk=".into(), 0.into(), 0.into()]).on_sheet(0),
            RawAction::new("setPictureName", vec![0.into(), "Logo".into()]).on_sheet(0),
            RawAction::new("setPictureWidth", vec![0.into(), 40.0.into()]).on_sheet(0),
            RawAction::new("setPictureHeight", vec![0.into(), 20.0.into()]).on_sheet(0),
            RawAction::new("updatePicture", vec!["aGVsbG8=".into(), 0.into(), "Banner".into()])
                .on_sheet(0),
            RawAction::new("deletePicture", vec![1.into()]).on_sheet(0),
        ],
    );

    let sheet = host.workbook().sheet(0).unwrap();
    assert_eq!(sheet.pictures().len(), 1);
    let picture = &sheet.pictures()[0];
    assert_eq!(picture.name, "Banner");
    assert_eq!(picture.anchor.to_a1_string(), "C2");
    assert_eq!((picture.left, picture.top), (5.0, 6.0));
    assert_eq!((picture.width, picture.height), (40.0, 20.0));
    assert_eq!(picture.image, b"hello".to_vec());

    let pictures = host.pictures(0).unwrap();
    assert_eq!(pictures[0].name, "Banner");
}

#[test]
fn test_name_actions() {
    let mut host = host(json!({
        "name": "Book1.xlsx",
        "sheets": [
            {"name": "Data", "values": [[1, 2], [3, 4]]},
            {"name": "Calc", "values": []}
        ]
    }));
    let deleted = |name: &str, book_scope: bool, sheet: usize| {
        RawAction::new(
            "nameDelete",
            vec![
                Value::Null,
                Value::Null,
                name.into(),
                Value::Null,
                book_scope.into(),
                sheet.into(),
            ],
        )
    };
    replay(
        &mut host,
        vec![
            RawAction::new("setRangeName", vec!["Block".into()]).on_range(0, 0, 0, 2, 2),
            RawAction::new("namesAdd", vec!["Rate".into(), "=Data!$B$2".into()]),
            RawAction::new("namesAdd", vec!["Local".into(), "=Calc!$A$1".into()]).on_sheet(1),
            RawAction::new("namesAdd", vec!["Spare".into(), "=Calc!$B$1".into()]).on_sheet(1),
            deleted("Rate", true, 0),
            deleted("Spare", false, 1),
        ],
    );

    let names = host.names().unwrap();
    let listed: Vec<_> = names.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(listed, vec!["Block", "Local"]);
    assert_eq!(names[0].address, "Data!$A$1:$B$2");
    assert!(names[0].book_scope);
    assert_eq!(names[1].scope_sheet_index, Some(1));
    assert_eq!(names[1].sheet_index, 1);
}

#[test]
fn test_range_structure_actions() {
    let mut host = host(json!({
        "name": "Book1.xlsx",
        "sheets": [
            {"name": "Data", "values": [["a", "b", "c"], ["d", "e", "f"], ["g", "h", "i"]]},
            {"name": "Copy", "values": []}
        ]
    }));
    replay(
        &mut host,
        vec![
            RawAction::new("rangeInsert", vec!["down".into()]).on_range(0, 1, 0, 1, 3),
            RawAction::new("rangeDelete", vec!["left".into()]).on_range(0, 0, 0, 1, 1),
            RawAction::new("copyRange", vec![1.into(), "B2".into()]).on_range(0, 2, 0, 1, 3),
            RawAction::new("setAutofit", vec!["columns".into()]).on_range(0, 0, 0, 1, 3),
            RawAction::new("setAutofit", vec!["rows".into()]).on_range(0, 0, 0, 2, 1),
        ],
    );
    assert_eq!(host.sync_count(), 0);

    let text = |sheet: usize, address: &str| {
        host.workbook()
            .sheet(sheet)
            .unwrap()
            .cell_value(address)
            .unwrap()
            .to_string()
    };
    assert_eq!(text(0, "A1"), "b");
    assert_eq!(text(0, "B1"), "c");
    assert_eq!(text(0, "C1"), "");
    assert_eq!(text(0, "A2"), "");
    assert_eq!(text(0, "A3"), "d");
    assert_eq!(text(0, "C4"), "i");
    assert_eq!(text(1, "B2"), "d");
    assert_eq!(text(1, "D2"), "f");

    let doc = host.to_document();
    assert_eq!(doc.sheets[0].autofit_columns, vec!["A", "B", "C"]);
    assert_eq!(doc.sheets[0].autofit_rows, vec![1, 2]);

    let reloaded = MemoryHost::from_document(&doc).unwrap();
    assert_eq!(reloaded.to_document().sheets[0].autofit_columns, vec!["A", "B", "C"]);
}
