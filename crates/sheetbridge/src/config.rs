//! Run settings: the workbook's config sheet merged with call-site options.
//!
//! Every setting resolves the same way: a non-empty explicit value wins, then
//! the config sheet entry, then nothing. Config keys are case-sensitive except
//! for the `header_` prefix.

use std::collections::BTreeMap;

use sheetbridge_core::CellValue;
use tracing::debug;

use crate::error::{Error, Result};
use crate::host::Host;

/// Name of the sheet holding key/value configuration
pub const CONFIG_SHEET: &str = "xlwings.conf";

const HEADER_PREFIX: &str = "header_";

/// Key/value pairs read from the config sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMap(BTreeMap<String, String>);

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the config region: first column keys, second column values.
    ///
    /// Reading stops at the first row without a key.
    pub fn from_region(rows: &[Vec<CellValue>]) -> Self {
        let mut map = BTreeMap::new();
        for row in rows {
            let key = match row.first() {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => break,
            };
            let value = row.get(1).map(ToString::to_string).unwrap_or_default();
            map.insert(key, value);
        }
        Self(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value for `key`, ignoring empty entries
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read the config sheet, empty when the workbook has none
pub fn read_config(host: &dyn Host) -> Result<ConfigMap> {
    match host.config_region(CONFIG_SHEET)? {
        Some(rows) => {
            let config = ConfigMap::from_region(&rows);
            debug!(entries = config.len(), "read config sheet");
            Ok(config)
        }
        None => Ok(ConfigMap::new()),
    }
}

/// HTTP headers with case-insensitive names. Insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing an existing one with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// Options given at the call site of a run.
///
/// Empty strings count as "not given".
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub url: Option<String>,
    pub auth: Option<String>,
    /// Older spelling of `auth`; takes priority when both are set
    pub api_key: Option<String>,
    /// Comma-separated sheet names to send, all others excluded
    pub include: Option<String>,
    /// Comma-separated sheet names to leave out
    pub exclude: Option<String>,
    pub headers: Headers,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn include(mut self, sheets: impl Into<String>) -> Self {
        self.include = Some(sheets.into());
        self
    }

    pub fn exclude(mut self, sheets: impl Into<String>) -> Self {
        self.exclude = Some(sheets.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Settings a run uses after merging options with the config sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub url: Option<String>,
    /// Headers to send, `Content-Type` not included
    pub headers: Headers,
    /// Sheets sent as placeholders
    pub exclude: Vec<String>,
}

/// Merge call-site options with the config sheet.
///
/// `sheet_names` is needed to turn an `include` list into its complement.
/// Giving both `include` and `exclude` (from any source) is a
/// [`Error::ConfigConflict`].
pub fn resolve(config: &ConfigMap, options: &RunOptions, sheet_names: &[String]) -> Result<Settings> {
    let url = pick(options.url.as_deref(), config.get("URL"));
    let auth = pick(options.auth.as_deref(), config.get("AUTH"));
    let api_key = pick(options.api_key.as_deref(), config.get("API_KEY"));
    let include = pick(options.include.as_deref(), config.get("INCLUDE"));
    let exclude = pick(options.exclude.as_deref(), config.get("EXCLUDE"));

    let exclude = match (include, exclude) {
        (Some(_), Some(_)) => return Err(Error::ConfigConflict),
        (Some(include), None) => {
            let include = split_list(&include);
            sheet_names
                .iter()
                .filter(|name| !include.contains(name))
                .cloned()
                .collect()
        }
        (None, Some(exclude)) => split_list(&exclude),
        (None, None) => Vec::new(),
    };

    let mut headers = if options.headers.is_empty() {
        config_headers(config)
    } else {
        options.headers.clone()
    };
    if !headers.contains("Authorization") {
        if let Some(token) = api_key.or(auth) {
            headers.insert("Authorization", token);
        }
    }

    Ok(Settings {
        url,
        headers,
        exclude,
    })
}

fn pick(explicit: Option<&str>, config: Option<&str>) -> Option<String> {
    explicit
        .filter(|v| !v.is_empty())
        .or(config)
        .map(str::to_string)
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `header_<Name>` entries, prefix matched case-insensitively
fn config_headers(config: &ConfigMap) -> Headers {
    config
        .iter()
        .filter_map(|(key, value)| {
            let prefix = key.get(..HEADER_PREFIX.len())?;
            if !prefix.eq_ignore_ascii_case(HEADER_PREFIX) {
                return None;
            }
            let name = &key[HEADER_PREFIX.len()..];
            (!name.is_empty()).then(|| (name.to_string(), value.to_string()))
        })
        .collect()
}
