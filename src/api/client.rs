use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{
    dto::{DeviceListResponse, ErrorBody},
    DeviceApi, DeviceUpdate, MutationResponse, NewDevice, RequestError,
};
use crate::{devices::Device, session::SessionProvider};

/// Authenticated client for the device API.
///
/// Every call asks the session provider for a current session and sends its
/// id token as the bearer credential. Nothing is cached or retried.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: Client::new(),
                base_url: base_url.trim_end_matches('/').to_owned(),
                session,
            }),
        }
    }

    /// Send `method path` with an optional JSON `body` and decode the JSON
    /// response.
    ///
    /// Fails with `RequestError::Session(AuthError::NoCurrentUser)` before any
    /// network traffic when nobody is signed in. Empty 2xx bodies decode as
    /// `{}`.
    pub async fn fetch_data<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, RequestError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let session = self.inner.session.current_session().await?;
        let url = format!("{}{}", self.inner.base_url, path);
        debug!(method = %method, url = %url, "Calling device API");

        let mut request = self
            .inner
            .http
            .request(method.clone(), &url)
            .bearer_auth(&session.id_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(status, &bytes);
            warn!(method = %method, url = %url, status = %status, error = %message, "Device API call failed");
            return Err(RequestError::Api { status, message });
        }

        let bytes: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// The server's `error` text when it sent one, else `HTTP <code>`.
fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(bytes)
        .ok()
        .and_then(|body| body.error)
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

fn device_path(device_id: &str) -> String {
    format!("/devices/{}", urlencoding::encode(device_id))
}

#[async_trait]
impl DeviceApi for ApiClient {
    /// Follows `lastEvaluatedKey` until the server stops returning one.
    async fn list_devices(&self) -> Result<Vec<Device>, RequestError> {
        let mut devices = Vec::new();
        let mut start_key: Option<String> = None;

        loop {
            let path = match &start_key {
                None => "/devices".to_owned(),
                Some(key) => format!("/devices?exclusiveStartKey={}", urlencoding::encode(key)),
            };
            let page: DeviceListResponse = self.fetch_data(Method::GET, &path, None::<&()>).await?;
            devices.extend(page.devices);

            match page.last_evaluated_key {
                // A server echoing the same key would otherwise loop forever.
                Some(key) if start_key.as_ref() != Some(&key) => start_key = Some(key),
                _ => break,
            }
        }

        debug!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    async fn get_device(&self, device_id: &str) -> Result<Device, RequestError> {
        self.fetch_data(Method::GET, &device_path(device_id), None::<&()>)
            .await
    }

    async fn create_device(&self, device: &NewDevice) -> Result<MutationResponse, RequestError> {
        let resp: MutationResponse = self
            .fetch_data(Method::POST, "/devices", Some(device))
            .await?;
        info!(
            device_id = ?resp.device.as_ref().map(|d| d.device_id.as_str()),
            "Device created"
        );
        Ok(resp)
    }

    async fn update_device(
        &self,
        device_id: &str,
        update: &DeviceUpdate,
    ) -> Result<MutationResponse, RequestError> {
        let resp = self
            .fetch_data(Method::PUT, &device_path(device_id), Some(update))
            .await?;
        info!(device_id = %device_id, status = %update.status, "Device updated");
        Ok(resp)
    }

    async fn delete_device(&self, device_id: &str) -> Result<MutationResponse, RequestError> {
        let resp = self
            .fetch_data(Method::DELETE, &device_path(device_id), None::<&()>)
            .await?;
        info!(device_id = %device_id, "Device deleted");
        Ok(resp)
    }
}
