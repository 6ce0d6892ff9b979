//! Wire types for the spreadsheet/backend round trip.
//!
//! One invocation is a single JSON request/response exchange:
//!
//! 1. the client POSTs a [`Payload`] describing the workbook,
//! 2. the backend answers with an [`ActionResponse`] holding a list of
//!    [`RawAction`]s,
//! 3. each raw action is decoded into a typed [`Action`] and applied in order.
//!
//! Streaming and REST custom functions use [`FunctionCall`] bodies.

mod action;
mod function;
mod payload;
mod value;

pub use action::{
    Action, ActionError, ActionResponse, AlertMode, AutofitAxis, Buttons, ClearScope, CopyOrigin,
    DeleteShift, InsertShift, RangeRef, RawAction,
};
pub use function::{task_key, FunctionCall, FunctionResult};
pub use payload::{BookInfo, NameInfo, Payload, PictureInfo, SheetSnapshot, TableInfo};
pub use value::Value;
