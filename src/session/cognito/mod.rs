pub mod models;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use reqwest::{header::CONTENT_TYPE, Client};
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;

use self::models::{
    AttributeType, AuthenticationResult, ConfirmSignUpRequest, ErrorBody, GlobalSignOutRequest,
    InitiateAuthRequest, InitiateAuthResponse, ResendConfirmationCodeRequest, SignUpRequest,
    REFRESH_TOKEN_AUTH, USER_PASSWORD_AUTH,
};
use super::{AuthError, Session, SessionProvider, SessionStore, User};

type HmacSha256 = Hmac<Sha256>;

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// Tokens are refreshed this many seconds before they expire.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Cognito user-pool client speaking the Identity Provider JSON API directly.
///
/// Holds at most one session, refreshed on demand by `current_session`.
#[derive(Debug, Clone)]
pub struct CognitoClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    endpoint: String,
    client_id: String,
    client_secret: Option<String>,
    store: Option<SessionStore>,
    session: Mutex<Option<Session>>,
}

impl CognitoClient {
    pub fn new(config: &Config) -> Self {
        let store = config
            .session_file
            .as_ref()
            .map(|path| SessionStore::new(path, &config.user_pool_id, &config.client_id));

        Self {
            inner: Arc::new(Inner {
                http: Client::new(),
                endpoint: config.cognito_endpoint.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                store,
                session: Mutex::new(None),
            }),
        }
    }

    /// Load a session saved by an earlier run, if a session file is configured.
    /// Returns whether one was found.
    pub async fn restore(&self) -> bool {
        let Some(store) = &self.inner.store else {
            return false;
        };
        match store.load().await {
            Some(session) => {
                info!(username = %session.username, "Restored saved session");
                *self.inner.session.lock().await = Some(session);
                true
            }
            None => false,
        }
    }

    /// POST one Identity Provider operation and decode its response.
    async fn call<Req, Resp>(&self, operation: &str, body: &Req) -> Result<Resp, AuthError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!(operation = %operation, endpoint = %self.inner.endpoint, "Calling Cognito");

        let payload =
            serde_json::to_vec(body).map_err(|e| AuthError::Decode(e.to_string()))?;

        let response = self
            .inner
            .http
            .post(&self.inner.endpoint)
            .header(CONTENT_TYPE, AMZ_JSON)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let err = match serde_json::from_slice::<ErrorBody>(&bytes) {
                Ok(body) => body.into_auth_error(status.as_u16()),
                Err(_) => AuthError::Provider {
                    code: format!("HTTP {}", status.as_u16()),
                    message: format!("HTTP {}", status.as_u16()),
                },
            };
            warn!(operation = %operation, status = %status, error = %err, "Cognito call failed");
            return Err(err);
        }

        // Operations without output (GlobalSignOut) answer with `{}` or nothing.
        let bytes: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        serde_json::from_slice(bytes)
            .map_err(|e| AuthError::Decode(format!("{operation}: {e}")))
    }

    fn secret_hash(&self, username: &str) -> Option<String> {
        self.inner
            .client_secret
            .as_deref()
            .map(|secret| secret_hash(secret, username, &self.inner.client_id))
    }

    async fn refresh(
        &self,
        username: &str,
        refresh_token: &str,
    ) -> Result<AuthenticationResult, AuthError> {
        let mut auth_parameters = HashMap::from([("REFRESH_TOKEN", refresh_token.to_owned())]);
        if let Some(hash) = self.secret_hash(username) {
            auth_parameters.insert("SECRET_HASH", hash);
        }

        let resp: InitiateAuthResponse = self
            .call(
                "InitiateAuth",
                &InitiateAuthRequest {
                    auth_flow: REFRESH_TOKEN_AUTH,
                    client_id: &self.inner.client_id,
                    auth_parameters,
                },
            )
            .await?;
        resp.into_result()
    }

    async fn forget_session(&self, guard: &mut Option<Session>) {
        *guard = None;
        if let Some(store) = &self.inner.store {
            store.clear().await;
        }
    }

    async fn remember_session(&self, guard: &mut Option<Session>, session: Session) {
        if let Some(store) = &self.inner.store {
            store.save(&session).await;
        }
        *guard = Some(session);
    }
}

#[async_trait]
impl SessionProvider for CognitoClient {
    async fn sign_up(&self, username: &str, password: &str, email: &str) -> Result<(), AuthError> {
        info!(username = %username, "Signing up");
        let _: serde::de::IgnoredAny = self
            .call(
                "SignUp",
                &SignUpRequest {
                    client_id: &self.inner.client_id,
                    username,
                    password,
                    user_attributes: vec![AttributeType {
                        name: "email".to_owned(),
                        value: email.to_owned(),
                    }],
                    secret_hash: self.secret_hash(username),
                },
            )
            .await?;
        Ok(())
    }

    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), AuthError> {
        info!(username = %username, "Confirming sign-up");
        let _: serde::de::IgnoredAny = self
            .call(
                "ConfirmSignUp",
                &ConfirmSignUpRequest {
                    client_id: &self.inner.client_id,
                    username,
                    confirmation_code: code,
                    secret_hash: self.secret_hash(username),
                },
            )
            .await?;
        Ok(())
    }

    async fn resend_sign_up_code(&self, username: &str) -> Result<(), AuthError> {
        info!(username = %username, "Resending confirmation code");
        let _: serde::de::IgnoredAny = self
            .call(
                "ResendConfirmationCode",
                &ResendConfirmationCodeRequest {
                    client_id: &self.inner.client_id,
                    username,
                    secret_hash: self.secret_hash(username),
                },
            )
            .await?;
        Ok(())
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let mut auth_parameters = HashMap::from([
            ("USERNAME", username.to_owned()),
            ("PASSWORD", password.to_owned()),
        ]);
        if let Some(hash) = self.secret_hash(username) {
            auth_parameters.insert("SECRET_HASH", hash);
        }

        let resp: InitiateAuthResponse = self
            .call(
                "InitiateAuth",
                &InitiateAuthRequest {
                    auth_flow: USER_PASSWORD_AUTH,
                    client_id: &self.inner.client_id,
                    auth_parameters,
                },
            )
            .await?;
        let result = resp.into_result()?;

        let session = Session {
            username: username.to_owned(),
            id_token: result.id_token,
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            expires_at: Utc::now() + Duration::seconds(result.expires_in),
        };
        let mut guard = self.inner.session.lock().await;
        self.remember_session(&mut guard, session).await;

        info!(username = %username, "Signed in");
        Ok(User {
            username: username.to_owned(),
        })
    }

    /// Local state is dropped first, so the user is signed out here even if
    /// the global sign-out call then fails.
    async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = {
            let mut guard = self.inner.session.lock().await;
            let previous = guard.take();
            self.forget_session(&mut guard).await;
            previous
        };

        let Some(session) = previous else {
            return Ok(());
        };

        info!(username = %session.username, "Signing out");
        let _: serde::de::IgnoredAny = self
            .call(
                "GlobalSignOut",
                &GlobalSignOutRequest {
                    access_token: &session.access_token,
                },
            )
            .await?;
        Ok(())
    }

    async fn current_session(&self) -> Result<Session, AuthError> {
        let mut guard = self.inner.session.lock().await;
        let now = Utc::now();

        let Some(cached) = guard.clone() else {
            return Err(AuthError::NoCurrentUser);
        };

        if cached.expires_at > now + Duration::seconds(REFRESH_MARGIN_SECS) {
            return Ok(cached);
        }

        let Some(refresh_token) = cached.refresh_token.clone() else {
            info!(username = %cached.username, "Session expired and cannot be refreshed");
            self.forget_session(&mut guard).await;
            return Err(AuthError::NoCurrentUser);
        };

        info!(username = %cached.username, "Refreshing Cognito session");
        let result = match self.refresh(&cached.username, &refresh_token).await {
            Ok(result) => result,
            Err(AuthError::Provider { code, message }) => {
                warn!(code = %code, message = %message, "Refresh rejected; dropping session");
                self.forget_session(&mut guard).await;
                return Err(AuthError::NoCurrentUser);
            }
            Err(e) => return Err(e),
        };

        let session = Session {
            username: cached.username,
            id_token: result.id_token,
            access_token: result.access_token,
            refresh_token: result.refresh_token.or(Some(refresh_token)),
            expires_at: now + Duration::seconds(result.expires_in),
        };
        self.remember_session(&mut guard, session.clone()).await;
        Ok(session)
    }

    async fn current_authenticated_user(&self) -> Result<User, AuthError> {
        let session = self.current_session().await?;
        Ok(User {
            username: session.username,
        })
    }
}

/// `SECRET_HASH` for app clients that have a secret:
/// `base64(HMAC-SHA256(key = secret, message = username + client_id))`.
pub(crate) fn secret_hash(secret: &str, username: &str, client_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
