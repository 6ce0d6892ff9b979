//! Prelude module - import commonly used types
//!
//! ```rust
//! use sheetbridge::prelude::*;
//! ```

pub use crate::{
    build_payload, CellValue, Client, ClientConfig, Error, Host, MemoryHost, Result, RunOptions,
    Value, Workbook,
};
