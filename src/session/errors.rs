use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Nobody is signed in, or the stored session can no longer be refreshed.
    #[error("No current user")]
    NoCurrentUser,

    /// The identity provider rejected the call. `message` is its own text.
    #[error("{message}")]
    Provider { code: String, message: String },

    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected identity provider response: {0}")]
    Decode(String),
}
