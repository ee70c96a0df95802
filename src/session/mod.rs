pub mod cognito;
pub mod errors;
pub mod store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use cognito::CognitoClient;
pub use errors::AuthError;
pub use store::SessionStore;

/// Tokens held for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    /// Sent to the device API as the bearer credential.
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
}

/// The hosted identity service behind both front-ends.
///
/// Implementations own the session lifecycle: callers only ask for the
/// current session or user, never refresh tokens themselves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Register `username`, recording `email` as its email attribute.
    async fn sign_up(&self, username: &str, password: &str, email: &str) -> Result<(), AuthError>;

    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), AuthError>;

    async fn resend_sign_up_code(&self, username: &str) -> Result<(), AuthError>;

    async fn sign_in(&self, username: &str, password: &str) -> Result<User, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// A session whose tokens are valid now, or `AuthError::NoCurrentUser`.
    async fn current_session(&self) -> Result<Session, AuthError>;

    async fn current_authenticated_user(&self) -> Result<User, AuthError>;
}
