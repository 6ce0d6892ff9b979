//! Sending the payload to the backend.

use sheetbridge_protocol::{ActionResponse, Payload};
use tracing::{debug, warn};

use crate::config::Headers;
use crate::error::{Error, Result};

/// Delivers a payload and returns the backend's actions.
pub trait Transport {
    fn post(&self, url: &str, headers: &Headers, payload: &Payload) -> Result<ActionResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, url: &str, headers: &Headers, payload: &Payload) -> Result<ActionResponse> {
        (**self).post(url, headers, payload)
    }
}

/// JSON over HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("sheetbridge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    /// Use an existing client, e.g. one with proxies or timeouts configured
    pub fn with_client(http: reqwest::blocking::Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, headers: &Headers, payload: &Payload) -> Result<ActionResponse> {
        let mut request = self.http.post(url);
        for (name, value) in headers.iter() {
            // Content-Type is always JSON
            if name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            request = request.header(name, value);
        }
        let request = request
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(payload)?);

        debug!(url, sheets = payload.sheets.len(), "posting payload");
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            warn!(url, status = status.as_u16(), "backend returned an error");
            return Err(Error::Remote {
                status: status.as_u16(),
                body,
            });
        }
        parse_response(&body)
    }
}

/// Decode a response body; `null` or an empty body means no actions.
pub fn parse_response(body: &str) -> Result<ActionResponse> {
    if body.trim().is_empty() {
        return Ok(ActionResponse::default());
    }
    let response: Option<ActionResponse> = serde_json::from_str(body)?;
    Ok(response.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_null_body_has_no_actions() {
        assert_eq!(parse_response("null").unwrap(), ActionResponse::default());
        assert_eq!(parse_response("  ").unwrap(), ActionResponse::default());
    }

    #[test]
    fn test_actions_are_kept_in_order() {
        let response = parse_response(
            r#"{"actions": [{"func": "addSheet", "args": [1]}, {"func": "activateSheet", "args": [1]}]}"#,
        )
        .unwrap();
        let funcs: Vec<_> = response.actions.iter().map(|a| a.func.as_str()).collect();
        assert_eq!(funcs, vec!["addSheet", "activateSheet"]);
    }

    #[test]
    fn test_malformed_body_is_json_error() {
        assert!(matches!(parse_response("<html>"), Err(Error::Json(_))));
    }
}
