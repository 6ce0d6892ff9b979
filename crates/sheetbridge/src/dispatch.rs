//! Applying backend actions to a host.
//!
//! Actions run strictly in order and the first failure stops the batch;
//! actions already applied stay applied. Each action is decoded just before
//! it runs, so an unknown op-code late in a batch does not prevent the
//! earlier ones.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sheetbridge_core::{CellAddress, Hyperlink, NameScope};
use sheetbridge_protocol::{Action, RawAction, Value};
use tracing::{debug, trace};

use crate::callbacks::Callbacks;
use crate::error::{Error, Result};
use crate::host::{Host, TableFlag};

/// Op-codes containing one of these are followed by a host sync, so later
/// actions see the new sheet or table structure.
pub const FORCE_SYNC_MARKERS: &[&str] = &["sheet", "table"];

/// Whether `func` changes structure that later actions depend on
pub fn needs_sync(func: &str) -> bool {
    let func = func.to_ascii_lowercase();
    FORCE_SYNC_MARKERS.iter().any(|marker| func.contains(marker))
}

/// Runs decoded actions against a host.
#[derive(Debug)]
pub struct Dispatcher<'a> {
    callbacks: &'a Callbacks,
}

impl<'a> Dispatcher<'a> {
    pub fn new(callbacks: &'a Callbacks) -> Self {
        Self { callbacks }
    }

    /// Apply a batch in order, returning how many actions ran.
    pub fn apply_all(&self, host: &mut dyn Host, actions: &[RawAction]) -> Result<usize> {
        for (i, raw) in actions.iter().enumerate() {
            trace!(index = i, func = %raw.func, "applying action");
            self.apply_raw(host, raw)?;
        }
        debug!(count = actions.len(), "applied actions");
        Ok(actions.len())
    }

    /// Decode and apply one wire action, syncing afterwards when needed.
    pub fn apply_raw(&self, host: &mut dyn Host, raw: &RawAction) -> Result<()> {
        match Action::decode(raw)? {
            Action::RunMacro { name, args } => self.run_macro(host, raw, name, args)?,
            action => self.apply(host, action)?,
        }
        if needs_sync(&raw.func) {
            host.sync()?;
        }
        Ok(())
    }

    /// Resolve `runMacro`: registered callbacks first, then built-in op-codes.
    ///
    /// A built-in runs with the remaining arguments and the target fields of
    /// the original action.
    fn run_macro(
        &self,
        host: &mut dyn Host,
        raw: &RawAction,
        name: String,
        args: Vec<Value>,
    ) -> Result<()> {
        if let Some(callback) = self.callbacks.get(&name) {
            debug!(callback = %name, "running callback");
            return callback(host, &args);
        }
        let redirected = RawAction {
            func: name,
            args,
            ..raw.clone()
        };
        match Action::decode(&redirected) {
            Err(sheetbridge_protocol::ActionError::Unknown(name)) => {
                Err(Error::MissingCallback(name))
            }
            Err(e) => Err(e.into()),
            Ok(_) => self.apply_raw(host, &redirected),
        }
    }

    /// Apply a decoded action. `RunMacro` only reaches callbacks here.
    pub fn apply(&self, host: &mut dyn Host, action: Action) -> Result<()> {
        match action {
            Action::SetValues { range, values } => {
                let values = values
                    .iter()
                    .map(|row| row.iter().map(Value::to_cell_value).collect())
                    .collect();
                host.set_values(&range, values)
            }
            Action::ClearRange { range, scope } => host.clear_range(&range, scope),
            Action::AddSheet { position, name } => host.add_sheet(position, name.as_deref()),
            Action::SetSheetName { sheet, name } => host.set_sheet_name(sheet, &name),
            Action::DeleteSheet { sheet } => host.delete_sheet(sheet),
            Action::ClearSheet { sheet, scope } => host.clear_sheet(sheet, scope),
            Action::ActivateSheet { sheet } => host.activate_sheet(sheet),
            Action::Autofit { range, axis } => host.autofit(&range, axis),
            Action::SetRangeColor { range, color } => host.set_range_color(&range, &color),
            Action::AddHyperlink {
                range,
                address,
                text_to_display,
                screen_tip,
            } => host.add_hyperlink(
                &range,
                Hyperlink {
                    address,
                    text_to_display,
                    screen_tip,
                },
            ),
            Action::SetNumberFormat { range, format } => host.set_number_format(&range, &format),
            Action::SetRangeName { range, name } => host.set_range_name(&range, &name),
            Action::AddName {
                sheet,
                name,
                refers_to,
            } => host.add_name(sheet, &name, &refers_to),
            Action::DeleteName {
                name,
                book_scope,
                scope_sheet,
            } => {
                let scope = match (book_scope, scope_sheet) {
                    (false, Some(sheet)) => NameScope::Sheet(sheet),
                    _ => NameScope::Workbook,
                };
                host.delete_name(&name, scope)
            }
            Action::DeleteRange { range, shift } => host.delete_range(&range, shift),
            Action::InsertRange {
                range,
                shift,
                copy_origin,
            } => host.insert_range(&range, shift, copy_origin),
            Action::SelectRange { range } => host.select_range(&range),
            Action::CopyRange {
                source,
                dest_sheet,
                dest_address,
            } => host.copy_range(&source, dest_sheet, &dest_address),
            Action::AddTable {
                sheet,
                source_address,
                has_headers,
                style,
                name,
            } => host.add_table(
                sheet,
                &source_address,
                has_headers,
                style.as_deref(),
                name.as_deref(),
            ),
            Action::SetTableName { sheet, table, name } => host.set_table_name(sheet, table, &name),
            Action::ResizeTable {
                sheet,
                table,
                address,
            } => host.resize_table(sheet, table, &address),
            Action::ShowTableAutofilter { sheet, table, show } => {
                host.set_table_flag(sheet, table, TableFlag::Autofilter, show)
            }
            Action::ShowTableHeaders { sheet, table, show } => {
                host.set_table_flag(sheet, table, TableFlag::Headers, show)
            }
            Action::ShowTableTotals { sheet, table, show } => {
                host.set_table_flag(sheet, table, TableFlag::Totals, show)
            }
            Action::SetTableStyle {
                sheet,
                table,
                style,
            } => host.set_table_style(sheet, table, &style),
            Action::AddPicture {
                sheet,
                image,
                column,
                row,
                left,
                top,
            } => {
                let anchor = CellAddress::checked(row, column)?;
                host.add_picture(sheet, decode_image(&image)?, anchor, left, top)
            }
            Action::UpdatePicture {
                sheet,
                image,
                index,
                name,
                width,
                height,
            } => host.update_picture(
                sheet,
                index,
                decode_image(&image)?,
                name.as_deref(),
                width,
                height,
            ),
            Action::DeletePicture { sheet, index } => host.delete_picture(sheet, index),
            Action::SetPictureName { sheet, index, name } => {
                host.set_picture_name(sheet, index, &name)
            }
            Action::SetPictureWidth {
                sheet,
                index,
                width,
            } => host.set_picture_size(sheet, index, Some(width), None),
            Action::SetPictureHeight {
                sheet,
                index,
                height,
            } => host.set_picture_size(sheet, index, None, Some(height)),
            Action::Alert {
                prompt,
                title,
                buttons,
                mode,
                callback,
            } => {
                let pressed = host.alert(&prompt, &title, buttons, mode)?;
                match callback {
                    Some(name) => {
                        let callback = self
                            .callbacks
                            .get(&name)
                            .ok_or(Error::MissingCallback(name))?;
                        callback(host, &[Value::from(pressed.unwrap_or_default())])
                    }
                    None => Ok(()),
                }
            }
            Action::RunMacro { name, args } => match self.callbacks.get(&name) {
                Some(callback) => callback(host, &args),
                None => Err(Error::MissingCallback(name)),
            },
        }
    }
}

fn decode_image(image: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(image.trim())
        .map_err(|e| Error::InvalidArgument(format!("image is not valid base64: {}", e)))
}
