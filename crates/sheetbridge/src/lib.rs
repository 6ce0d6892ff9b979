//! # sheetbridge
//!
//! Client side of a spreadsheet-to-backend bridge.
//!
//! A run snapshots the workbook into a JSON payload, POSTs it to a compute
//! backend and replays the actions the backend returns, in order, against the
//! workbook. The same host abstraction serves custom functions, both plain
//! REST calls and long-lived streaming ones.
//!
//! ## Features
//!
//! - Config resolution from call-site options and an `xlwings.conf` sheet
//! - Payload building with include/exclude filtering and ISO-8601 dates
//! - Every backend action, decoded and dispatched through the [`Host`] trait
//! - Callbacks for `runMacro` and alert responses
//! - [`MemoryHost`], an in-memory host with a JSON document format
//! - Streaming and REST custom functions
//!
//! ## Example
//!
//! ```rust,no_run
//! use sheetbridge::prelude::*;
//!
//! let mut host = MemoryHost::new(Workbook::new("Book1.xlsx"));
//! let client = Client::new(ClientConfig::default())?;
//! let summary = client.run(&mut host, &RunOptions::new().url("http://127.0.0.1:8000/hello"))?;
//! println!("applied {} actions", summary.actions_applied);
//! # Ok::<(), sheetbridge::Error>(())
//! ```

pub mod callbacks;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod functions;
pub mod host;
pub mod memory;
pub mod payload;
pub mod prelude;
pub mod streaming;
pub mod transport;

pub use callbacks::{Callback, Callbacks};
pub use client::{Client, ClientConfig, RunSummary};
pub use config::{read_config, resolve, ConfigMap, Headers, RunOptions, Settings, CONFIG_SHEET};
pub use dispatch::{needs_sync, Dispatcher};
pub use error::{Error, Result};
pub use functions::FunctionClient;
pub use host::{Host, TableFlag};
pub use memory::{AlertRecord, BookDocument, MemoryHost};
pub use payload::build_payload;
pub use streaming::{StreamEvent, StreamRegistry};
pub use transport::{HttpTransport, Transport};

pub use sheetbridge_core::{CellValue, Workbook};
pub use sheetbridge_protocol::{Action, ActionResponse, Payload, RawAction, Value};
