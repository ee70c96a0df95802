use reqwest::StatusCode;
use thiserror::Error;

use crate::session::AuthError;

/// Why an authenticated device-API call failed.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Session(#[from] AuthError),

    /// Non-2xx response. `message` is the body's `error` field when present,
    /// otherwise `HTTP <status>`.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RequestError {
    pub fn is_no_current_user(&self) -> bool {
        matches!(self, RequestError::Session(AuthError::NoCurrentUser))
    }
}
