use std::fmt;

use serde::{Deserialize, Serialize};
use sheetbridge_core::{date, CellValue};

/// A primitive JSON value as it appears in payload cells and action arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    /// Convert an incoming value into a cell value
    ///
    /// Strings that parse strictly as ISO-8601 date/times become dates;
    /// every other string is kept verbatim, and `null` clears the cell.
    pub fn to_cell_value(&self) -> CellValue {
        match self {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Boolean(*b),
            Value::Number(n) => CellValue::Number(*n),
            Value::String(s) => match date::parse_iso_datetime(s) {
                Some(dt) => CellValue::DateTime(dt),
                None => CellValue::String(s.clone()),
            },
        }
    }
}

/// Loose text rendering, the way a script host stringifies arguments
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

/// Payload encoding of a cell: dates as ISO text, empty cells as `""`,
/// error cells as their code.
impl From<&CellValue> for Value {
    fn from(cell: &CellValue) -> Self {
        match cell {
            CellValue::Empty => Value::String(String::new()),
            CellValue::Boolean(b) => Value::Bool(*b),
            CellValue::Number(n) => Value::Number(*n),
            CellValue::String(s) => Value::String(s.clone()),
            CellValue::DateTime(dt) => Value::String(date::to_iso_string(dt)),
            CellValue::Error(e) => Value::String(e.as_str().to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetbridge_core::CellError;

    #[test]
    fn test_untagged_json() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, true, 3, 2.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Number(3.0),
                Value::Number(2.5),
                Value::from("x"),
            ]
        );
    }

    #[test]
    fn test_cell_encoding() {
        assert_eq!(Value::from(&CellValue::Empty), Value::from(""));
        assert_eq!(
            Value::from(&CellValue::Error(CellError::Na)),
            Value::from("#N/A")
        );
        let dt = date::serial_to_datetime(44941.25, false).unwrap();
        assert_eq!(
            Value::from(&CellValue::DateTime(dt)),
            Value::from("2023-01-15T06:00:00.000")
        );
    }

    #[test]
    fn test_incoming_dates_are_strict() {
        assert!(matches!(
            Value::from("2023-01-15T06:00:00").to_cell_value(),
            CellValue::DateTime(_)
        ));
        assert_eq!(
            Value::from("Total revenue in T1").to_cell_value(),
            CellValue::from("Total revenue in T1")
        );
        assert_eq!(Value::Null.to_cell_value(), CellValue::Empty);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(2.0).to_string(), "2");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }
}
