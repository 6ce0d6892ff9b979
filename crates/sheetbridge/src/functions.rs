//! Custom functions evaluated by the backend over REST.

use sheetbridge_protocol::{FunctionCall, FunctionResult, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Attempts made before a call is reported as failed
pub const MAX_RETRIES: u32 = 5;

/// Posts custom-function calls, retrying failed attempts.
#[derive(Debug, Clone)]
pub struct FunctionClient {
    http: reqwest::blocking::Client,
    url: String,
    auth: Option<String>,
    session_id: Option<String>,
    max_retries: u32,
}

impl FunctionClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("sheetbridge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
            auth: None,
            session_id: None,
            max_retries: MAX_RETRIES,
        })
    }

    /// Value of the `Authorization` header
    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    /// Session id sent as the `sid` header
    pub fn with_session_id(mut self, sid: impl Into<String>) -> Self {
        self.session_id = Some(sid.into());
        self
    }

    /// Number of attempts, at least one
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Evaluate a call, returning the result matrix.
    ///
    /// Every failure is retried, up to the attempt limit; the last error is
    /// returned when all attempts fail.
    pub fn call(&self, body: &FunctionCall) -> Result<Vec<Vec<Value>>> {
        let mut last_error = None;
        for attempt in 1..=self.max_retries {
            match self.try_call(body) {
                Ok(result) => {
                    debug!(func = %body.func_name, attempt, "custom function returned");
                    return Ok(result);
                }
                Err(err) => {
                    warn!(func = %body.func_name, attempt, error = %err, "custom function call failed");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::InvalidArgument("no attempts made".to_string())))
    }

    fn try_call(&self, body: &FunctionCall) -> Result<Vec<Vec<Value>>> {
        let mut request = self
            .http
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?);
        if let Some(auth) = &self.auth {
            request = request.header(reqwest::header::AUTHORIZATION, auth.as_str());
        }
        if let Some(sid) = &self.session_id {
            request = request.header("sid", sid.as_str());
        }

        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(Error::Remote {
                status: status.as_u16(),
                body: text,
            });
        }
        let result: FunctionResult = serde_json::from_str(&text)?;
        Ok(result.result)
    }
}
