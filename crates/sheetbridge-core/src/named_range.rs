//! Named range definitions
//!
//! Names are either workbook-wide or scoped to one sheet. Lookups are
//! case-insensitive, and the collection keeps definition order so that
//! anything enumerating names is deterministic.

use crate::cell::{parse_reference, quote_sheet_name, CellRange};
use crate::error::{Error, Result};

/// Scope of a named range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScope {
    /// Available throughout the workbook (global)
    Workbook,
    /// Scoped to a specific sheet (local), by sheet index
    Sheet(usize),
}

/// A named range definition
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    /// The name (e.g., "SalesData"); case-insensitive
    pub name: String,
    pub scope: NameScope,
    /// What the name refers to, e.g. `=Sheet1!$A$1:$D$10` or `=0.07`
    pub refers_to: String,
}

impl NamedRange {
    /// Create a new named range
    pub fn new(name: impl Into<String>, refers_to: impl Into<String>, scope: NameScope) -> Self {
        Self {
            name: name.into(),
            scope,
            refers_to: refers_to.into(),
        }
    }

    /// Create a workbook-scoped named range
    pub fn workbook_scope(name: impl Into<String>, refers_to: impl Into<String>) -> Self {
        Self::new(name, refers_to, NameScope::Workbook)
    }

    /// Create a sheet-scoped named range
    pub fn sheet_scope(
        name: impl Into<String>,
        refers_to: impl Into<String>,
        sheet_index: usize,
    ) -> Self {
        Self::new(name, refers_to, NameScope::Sheet(sheet_index))
    }

    /// Build the `=Sheet!$A$1` form for a range on a sheet
    pub fn reference_to(sheet_name: &str, range: &CellRange) -> String {
        format!(
            "={}!{}",
            quote_sheet_name(sheet_name),
            range.to_absolute_string()
        )
    }

    /// The sheet and range this name points at, if it is a range reference
    pub fn target(&self) -> Option<(String, CellRange)> {
        match parse_reference(&self.refers_to) {
            Ok((Some(sheet), range)) => Some((sheet, range)),
            _ => None,
        }
    }
}

/// Collection of named ranges
#[derive(Debug, Default, Clone)]
pub struct NamedRangeCollection {
    ranges: Vec<NamedRange>,
}

impl NamedRangeCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str, scope: &NameScope) -> Option<usize> {
        self.ranges
            .iter()
            .position(|r| r.scope == *scope && r.name.eq_ignore_ascii_case(name))
    }

    /// Define a new named range
    ///
    /// Returns an error if a name with the same scope already exists
    pub fn define(&mut self, range: NamedRange) -> Result<()> {
        validate_name(&range.name)?;
        if self.position(&range.name, &range.scope).is_some() {
            return Err(Error::InvalidName(format!(
                "'{}' already exists in this scope",
                range.name
            )));
        }
        self.ranges.push(range);
        Ok(())
    }

    /// Define or update a named range, keeping its position if it exists
    pub fn define_or_update(&mut self, range: NamedRange) -> Result<()> {
        validate_name(&range.name)?;
        match self.position(&range.name, &range.scope) {
            Some(idx) => self.ranges[idx] = range,
            None => self.ranges.push(range),
        }
        Ok(())
    }

    /// Get a named range by exact scope
    pub fn get_exact(&self, name: &str, scope: &NameScope) -> Option<&NamedRange> {
        self.position(name, scope).map(|idx| &self.ranges[idx])
    }

    /// Remove a named range
    pub fn remove(&mut self, name: &str, scope: &NameScope) -> Option<NamedRange> {
        self.position(name, scope).map(|idx| self.ranges.remove(idx))
    }

    /// Iterate over all named ranges in definition order
    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Get all workbook-scoped names
    pub fn workbook_names(&self) -> impl Iterator<Item = &NamedRange> {
        self.ranges
            .iter()
            .filter(|r| matches!(r.scope, NameScope::Workbook))
    }

    /// Get all names scoped to a specific sheet
    pub fn sheet_names(&self, sheet_index: usize) -> impl Iterator<Item = &NamedRange> {
        self.ranges
            .iter()
            .filter(move |r| matches!(r.scope, NameScope::Sheet(idx) if idx == sheet_index))
    }

    /// Keep sheet scopes pointing at the same sheets after one is inserted
    pub(crate) fn sheet_inserted(&mut self, index: usize) {
        for r in &mut self.ranges {
            if let NameScope::Sheet(idx) = &mut r.scope {
                if *idx >= index {
                    *idx += 1;
                }
            }
        }
    }

    /// Drop names scoped to a removed sheet and renumber the rest
    pub(crate) fn sheet_removed(&mut self, index: usize) {
        self.ranges
            .retain(|r| !matches!(r.scope, NameScope::Sheet(idx) if idx == index));
        for r in &mut self.ranges {
            if let NameScope::Sheet(idx) = &mut r.scope {
                if *idx > index {
                    *idx -= 1;
                }
            }
        }
    }

    /// Rewrite references to a renamed sheet
    pub(crate) fn sheet_renamed(&mut self, old: &str, new: &str) {
        for r in &mut self.ranges {
            if let Some((sheet, range)) = r.target() {
                if sheet == old {
                    r.refers_to = NamedRange::reference_to(new, &range);
                }
            }
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map_or(false, |c| c.is_alphabetic() || c == '_' || c == '\\');
    if !valid_start || !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        return Err(Error::InvalidName(format!("'{}' is not a valid name", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scope_lookup() {
        let mut coll = NamedRangeCollection::new();
        coll.define(NamedRange::workbook_scope("Rate", "=Sheet1!$A$1"))
            .unwrap();
        coll.define(NamedRange::sheet_scope("Rate", "=Sheet2!$B$1", 1))
            .unwrap();

        assert_eq!(
            coll.get_exact("rate", &NameScope::Sheet(1)).unwrap().refers_to,
            "=Sheet2!$B$1"
        );
        assert_eq!(
            coll.get_exact("RATE", &NameScope::Workbook).unwrap().refers_to,
            "=Sheet1!$A$1"
        );
        assert!(coll
            .define(NamedRange::workbook_scope("RATE", "=Sheet1!$C$1"))
            .is_err());
    }

    #[test]
    fn test_definition_order_is_kept() {
        let mut coll = NamedRangeCollection::new();
        for name in ["zeta", "alpha", "mid"] {
            coll.define(NamedRange::workbook_scope(name, "=Sheet1!$A$1"))
                .unwrap();
        }
        let names: Vec<_> = coll.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_invalid_names() {
        let mut coll = NamedRangeCollection::new();
        assert!(coll.define(NamedRange::workbook_scope("", "=A1")).is_err());
        assert!(coll.define(NamedRange::workbook_scope("1abc", "=A1")).is_err());
        assert!(coll.define(NamedRange::workbook_scope("a b", "=A1")).is_err());
    }

    #[test]
    fn test_target() {
        let nr = NamedRange::workbook_scope("Data", "='My Data'!$A$1:$B$3");
        let (sheet, range) = nr.target().unwrap();
        assert_eq!(sheet, "My Data");
        assert_eq!(range.to_a1_string(), "$A$1:$B$3");

        assert!(NamedRange::workbook_scope("Tax", "=0.07").target().is_none());
    }

    #[test]
    fn test_sheet_bookkeeping() {
        let mut coll = NamedRangeCollection::new();
        coll.define(NamedRange::sheet_scope("a", "=S1!$A$1", 0)).unwrap();
        coll.define(NamedRange::sheet_scope("b", "=S2!$A$1", 1)).unwrap();
        coll.define(NamedRange::sheet_scope("c", "=S3!$A$1", 2)).unwrap();

        coll.sheet_removed(1);
        let scopes: Vec<_> = coll.iter().map(|r| (r.name.clone(), r.scope)).collect();
        assert_eq!(
            scopes,
            vec![
                ("a".to_string(), NameScope::Sheet(0)),
                ("c".to_string(), NameScope::Sheet(1)),
            ]
        );

        coll.sheet_inserted(0);
        assert_eq!(coll.get_exact("a", &NameScope::Sheet(1)).unwrap().name, "a");

        coll.sheet_renamed("S3", "Totals 2");
        assert_eq!(
            coll.get_exact("c", &NameScope::Sheet(2)).unwrap().refers_to,
            "='Totals 2'!$A$1"
        );
    }
}
