//! Request and response bodies of the Cognito Identity Provider JSON API.
//!
//! Field names are PascalCase on the wire. Every operation is a `POST /` with
//! `X-Amz-Target: AWSCognitoIdentityProviderService.<Operation>`.
//!
//! Reference: <https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/Welcome.html>

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::session::AuthError;

// ---------------------------------------------------------------------------
// Errors
//
// Failures come back with a 4xx/5xx status and a body like:
//   { "__type": "NotAuthorizedException", "message": "Incorrect username or password." }
// Some services prefix the type with a namespace ("...#NotAuthorizedException")
// and spell the message key `Message`.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "__type")]
    pub error_type: Option<String>,
    #[serde(alias = "Message")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_auth_error(self, status: u16) -> AuthError {
        let code = self
            .error_type
            .as_deref()
            .map(|t| t.rsplit('#').next().unwrap_or(t).to_owned())
            .unwrap_or_else(|| format!("HTTP {status}"));
        let message = self.message.unwrap_or_else(|| code.clone());
        AuthError::Provider { code, message }
    }
}

// ---------------------------------------------------------------------------
// SignUp / ConfirmSignUp / ResendConfirmationCode
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeType {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignUpRequest<'a> {
    pub client_id: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub user_attributes: Vec<AttributeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_hash: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfirmSignUpRequest<'a> {
    pub client_id: &'a str,
    pub username: &'a str,
    pub confirmation_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_hash: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResendConfirmationCodeRequest<'a> {
    pub client_id: &'a str,
    pub username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// InitiateAuth
// ---------------------------------------------------------------------------

pub const USER_PASSWORD_AUTH: &str = "USER_PASSWORD_AUTH";
pub const REFRESH_TOKEN_AUTH: &str = "REFRESH_TOKEN_AUTH";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitiateAuthRequest<'a> {
    pub auth_flow: &'static str,
    pub client_id: &'a str,
    /// `USERNAME`/`PASSWORD`, or `REFRESH_TOKEN`, plus `SECRET_HASH` when the
    /// app client has a secret.
    pub auth_parameters: HashMap<&'static str, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitiateAuthResponse {
    pub authentication_result: Option<AuthenticationResult>,
    /// Set instead of a result when Cognito wants another round trip
    /// (MFA, forced password change).
    pub challenge_name: Option<String>,
}

impl InitiateAuthResponse {
    pub fn into_result(self) -> Result<AuthenticationResult, AuthError> {
        match (self.authentication_result, self.challenge_name) {
            (Some(result), _) => Ok(result),
            (None, Some(challenge)) => Err(AuthError::Provider {
                code: "ChallengeRequired".to_owned(),
                message: format!("Sign-in requires the {challenge} challenge, which is not supported"),
            }),
            (None, None) => Err(AuthError::Decode(
                "InitiateAuth returned neither a result nor a challenge".to_owned(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub id_token: String,
    pub access_token: String,
    /// Absent on `REFRESH_TOKEN_AUTH`; the old refresh token stays valid.
    pub refresh_token: Option<String>,
    /// Token validity in seconds.
    pub expires_in: i64,
}

// ---------------------------------------------------------------------------
// GlobalSignOut
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalSignOutRequest<'a> {
    pub access_token: &'a str,
}
