//! Date serials, number-format categories and ISO-8601 text
//!
//! Hosts hand out dates in one of two shapes: a numeric serial plus the
//! cell's number-format category, or an already formatted string. Both are
//! turned into a [`CellValue::DateTime`](crate::CellValue::DateTime) here, and
//! [`to_iso_string`] is the single place that renders one for the wire.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Largest serial the model accepts (9999-12-31)
const MAX_SERIAL: f64 = 2_958_466.0;

fn epoch(date_1904: bool) -> Option<NaiveDateTime> {
    let date = if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else {
        // Day 0 of the 1900 system, once the phantom 1900-02-29 is accounted for.
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    Some(date.and_time(NaiveTime::MIN))
}

/// Convert a date serial to a date/time, rounded to the millisecond
///
/// Returns `None` for negative, non-finite or out-of-range serials.
pub fn serial_to_datetime(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_SERIAL {
        return None;
    }
    let ms = (serial * MS_PER_DAY).round() as i64;
    epoch(date_1904)?.checked_add_signed(Duration::milliseconds(ms))
}

/// Convert a date/time back to a serial
pub fn datetime_to_serial(dt: &NaiveDateTime, date_1904: bool) -> Option<f64> {
    let delta = dt.signed_duration_since(epoch(date_1904)?);
    Some(delta.num_milliseconds() as f64 / MS_PER_DAY)
}

/// Render a date/time the way the payload carries it
///
/// `YYYY-MM-DD` at exactly midnight, `YYYY-MM-DDTHH:MM:SS.mmm` otherwise.
pub fn to_iso_string(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

/// Strictly parse an ISO-8601 date/time string
///
/// The string must contain a `T` separator. A trailing `Z` or UTC offset is
/// accepted; the wall-clock time in that offset is kept. Anything that does
/// not parse completely is not a date.
///
/// ```
/// use sheetbridge_core::date::parse_iso_datetime;
///
/// assert!(parse_iso_datetime("2023-01-15T10:30:00").is_some());
/// assert!(parse_iso_datetime("2023-01-15T10:30:00.250Z").is_some());
/// assert!(parse_iso_datetime("not a date, 19 chars").is_none());
/// ```
pub fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if !s.contains('T') {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    let naive = s.strip_suffix('Z').unwrap_or(s);
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Broad classification of a number format, as hosts report it per cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormatCategory {
    General,
    Number,
    Percentage,
    Scientific,
    Text,
    Date,
    Time,
}

impl NumberFormatCategory {
    /// Parse a host-reported category name (`"Date"`, `"Time"`, ...)
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "general" => Self::General,
            "percentage" => Self::Percentage,
            "scientific" => Self::Scientific,
            "text" => Self::Text,
            "date" => Self::Date,
            "time" => Self::Time,
            _ => Self::Number,
        }
    }

    /// Classify a number format code such as `yyyy-mm-dd` or `0.00%`
    pub fn from_format_code(code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() || code.eq_ignore_ascii_case("general") {
            return Self::General;
        }
        if code == "@" {
            return Self::Text;
        }

        // Only the first section counts; quoted literals and [..] blocks
        // (colors, locales, elapsed-time markers aside) carry no meaning here.
        let section = code.split(';').next().unwrap_or(code);
        let mut plain = String::with_capacity(section.len());
        let mut chars = section.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    for q in chars.by_ref() {
                        if q == '"' {
                            break;
                        }
                    }
                }
                '[' => {
                    let mut block = String::new();
                    for b in chars.by_ref() {
                        if b == ']' {
                            break;
                        }
                        block.push(b);
                    }
                    let block = block.to_ascii_lowercase();
                    if matches!(block.as_str(), "h" | "hh" | "m" | "mm" | "s" | "ss") {
                        plain.push_str(&block);
                    }
                }
                '\\' => {
                    chars.next();
                }
                _ => plain.push(c.to_ascii_lowercase()),
            }
        }

        if plain.contains('y') || plain.contains('d') {
            Self::Date
        } else if plain.contains('h') || plain.contains('s') {
            Self::Time
        } else if plain.contains('m') && !plain.contains('0') && !plain.contains('#') {
            Self::Date
        } else if plain.contains("e+") || plain.contains("e-") {
            Self::Scientific
        } else if plain.contains('%') {
            Self::Percentage
        } else {
            Self::Number
        }
    }

    /// Whether numbers in this category are dates or times
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time)
    }
}

/// Read a numeric cell, turning it into a date when its format says so
pub fn from_host_number(
    value: f64,
    category: NumberFormatCategory,
    date_1904: bool,
) -> crate::CellValue {
    if category.is_temporal() {
        if let Some(dt) = serial_to_datetime(value, date_1904) {
            return crate::CellValue::DateTime(dt);
        }
    }
    crate::CellValue::Number(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellValue;
    use pretty_assertions::assert_eq;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_serial_midnight_is_date_only() {
        let dt = serial_to_datetime(44941.0, false).unwrap();
        assert_eq!(dt, ymd_hms(2023, 1, 15, 0, 0, 0));
        assert_eq!(to_iso_string(&dt), "2023-01-15");
    }

    #[test]
    fn test_serial_with_time_keeps_suffix() {
        let dt = serial_to_datetime(44941.5, false).unwrap();
        assert_eq!(to_iso_string(&dt), "2023-01-15T12:00:00.000");

        let dt = serial_to_datetime(44941.0 + 1.0 / 86_400.0, false).unwrap();
        assert_eq!(to_iso_string(&dt), "2023-01-15T00:00:01.000");
    }

    #[test]
    fn test_serial_1904_system() {
        let dt = serial_to_datetime(43479.0, true).unwrap();
        assert_eq!(dt, ymd_hms(2023, 1, 15, 0, 0, 0));
    }

    #[test]
    fn test_serial_round_trip() {
        let dt = ymd_hms(2024, 2, 29, 18, 45, 30);
        let serial = datetime_to_serial(&dt, false).unwrap();
        assert_eq!(serial_to_datetime(serial, false), Some(dt));
    }

    #[test]
    fn test_serial_out_of_range() {
        assert_eq!(serial_to_datetime(-1.0, false), None);
        assert_eq!(serial_to_datetime(f64::NAN, false), None);
        assert_eq!(serial_to_datetime(1e12, false), None);
    }

    #[test]
    fn test_parse_iso_strict() {
        assert_eq!(
            parse_iso_datetime("2023-01-15T10:30:00"),
            Some(ymd_hms(2023, 1, 15, 10, 30, 0))
        );
        assert_eq!(
            parse_iso_datetime("2023-01-15T10:30:00Z"),
            Some(ymd_hms(2023, 1, 15, 10, 30, 0))
        );
        assert_eq!(
            parse_iso_datetime("2023-01-15T10:30:00+02:00"),
            Some(ymd_hms(2023, 1, 15, 10, 30, 0))
        );
        assert_eq!(
            parse_iso_datetime("2023-01-15T10:30"),
            Some(ymd_hms(2023, 1, 15, 10, 30, 0))
        );
        // 19 characters with a T, but not a date
        assert_eq!(parse_iso_datetime("The quick brown fox"), None);
        assert_eq!(parse_iso_datetime("2023-01-15"), None);
    }

    #[test]
    fn test_format_code_categories() {
        use NumberFormatCategory::*;
        assert_eq!(NumberFormatCategory::from_format_code("General"), General);
        assert_eq!(NumberFormatCategory::from_format_code("yyyy-mm-dd"), Date);
        assert_eq!(NumberFormatCategory::from_format_code("m/d/yyyy h:mm"), Date);
        assert_eq!(NumberFormatCategory::from_format_code("hh:mm:ss"), Time);
        assert_eq!(NumberFormatCategory::from_format_code("[h]:mm"), Time);
        assert_eq!(NumberFormatCategory::from_format_code("mmm"), Date);
        assert_eq!(NumberFormatCategory::from_format_code("0.00%"), Percentage);
        assert_eq!(NumberFormatCategory::from_format_code("0.00E+00"), Scientific);
        assert_eq!(NumberFormatCategory::from_format_code("#,##0.00"), Number);
        assert_eq!(
            NumberFormatCategory::from_format_code("[Red]#,##0\" days\""),
            Number
        );
        assert_eq!(NumberFormatCategory::from_format_code("@"), Text);
    }

    #[test]
    fn test_from_host_number() {
        let v = from_host_number(44941.0, NumberFormatCategory::from_name("Date"), false);
        assert_eq!(v, CellValue::DateTime(ymd_hms(2023, 1, 15, 0, 0, 0)));

        let v = from_host_number(44941.0, NumberFormatCategory::from_name("General"), false);
        assert_eq!(v, CellValue::Number(44941.0));
    }
}
