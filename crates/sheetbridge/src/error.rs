//! Error types for sheetbridge.

use sheetbridge_protocol::ActionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// `include` and `exclude` were both given
    #[error("Either use 'include' or 'exclude', but not both!")]
    ConfigConflict,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend answered with a non-success status; the message is the raw body.
    #[error("{body}")]
    Remote { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown action: '{0}'")]
    UnknownAction(String),

    #[error(transparent)]
    InvalidAction(ActionError),

    /// The host has no equivalent for this action
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Didn't find callback '{0}'! Make sure to register it before running the bridge.")]
    MissingCallback(String),

    #[error(transparent)]
    Workbook(#[from] sheetbridge_core::Error),

    #[error("Stream channel closed")]
    StreamClosed,
}

impl From<ActionError> for Error {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Unknown(func) => Error::UnknownAction(func),
            other => Error::InvalidAction(other),
        }
    }
}

impl Error {
    pub(crate) fn not_implemented(func: &str) -> Self {
        Error::NotImplemented(func.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
