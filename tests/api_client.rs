//! `ApiClient` against an in-process fake of the device API.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use device_portal::{
    api::{ApiClient, DeviceApi, DeviceUpdate, NewDevice, RequestError},
    session::{AuthError, Session, SessionProvider, User},
};

// ---------------------------------------------------------------------------
// Fixed session provider
// ---------------------------------------------------------------------------

struct StaticSession(Option<Session>);

impl StaticSession {
    fn signed_in() -> Arc<Self> {
        Arc::new(Self(Some(Session {
            username: "admin@example.com".to_owned(),
            id_token: "id-token".to_owned(),
            access_token: "access-token".to_owned(),
            refresh_token: None,
            expires_at: Utc::now() + Duration::hours(1),
        })))
    }

    fn signed_out() -> Arc<Self> {
        Arc::new(Self(None))
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn sign_up(&self, _: &str, _: &str, _: &str) -> Result<(), AuthError> {
        unimplemented!()
    }

    async fn confirm_sign_up(&self, _: &str, _: &str) -> Result<(), AuthError> {
        unimplemented!()
    }

    async fn resend_sign_up_code(&self, _: &str) -> Result<(), AuthError> {
        unimplemented!()
    }

    async fn sign_in(&self, _: &str, _: &str) -> Result<User, AuthError> {
        unimplemented!()
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        unimplemented!()
    }

    async fn current_session(&self) -> Result<Session, AuthError> {
        self.0.clone().ok_or(AuthError::NoCurrentUser)
    }

    async fn current_authenticated_user(&self) -> Result<User, AuthError> {
        let session = self.current_session().await?;
        Ok(User {
            username: session.username,
        })
    }
}

// ---------------------------------------------------------------------------
// Fake device API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Recorded {
    method: &'static str,
    path: String,
    content_type: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct Fake {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Fake {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: Option<Value>) {
        self.requests.lock().unwrap().push(Recorded {
            method,
            path,
            content_type: headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            body,
        });
    }
}

type Reply = (StatusCode, Json<Value>);

fn authorized(headers: &HeaderMap) -> Result<(), Reply> {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Bearer id-token") => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )),
    }
}

fn device(id: &str, status: &str) -> Value {
    json!({
        "deviceId": id,
        "name": format!("Device {id}"),
        "type": "light",
        "status": status,
        "lastUpdated": "2024-05-01T12:00:00.000Z"
    })
}

async fn list(
    State(fake): State<Fake>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let start = query.get("exclusiveStartKey").cloned();
    let path = match &start {
        Some(key) => format!("/devices?exclusiveStartKey={key}"),
        None => "/devices".to_owned(),
    };
    fake.record("GET", path, &headers, None);
    if let Err(reply) = authorized(&headers) {
        return reply;
    }

    let body = match start.as_deref() {
        None => json!({ "devices": [device("a", "on")], "lastEvaluatedKey": "a" }),
        Some("a") => json!({ "devices": [device("b", "off")], "lastEvaluatedKey": "b" }),
        Some(_) => json!({ "devices": [device("c", "open")] }),
    };
    (StatusCode::OK, Json(body))
}

async fn create(State(fake): State<Fake>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    fake.record("POST", "/devices".to_owned(), &headers, Some(body.clone()));
    if let Err(reply) = authorized(&headers) {
        return reply;
    }
    if body.get("name").and_then(Value::as_str).unwrap_or("").is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing or empty required field: name" })),
        );
    }

    let mut created = body.clone();
    created["deviceId"] = json!("generated-id");
    created["lastUpdated"] = json!("2024-05-01T12:00:00.000Z");
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Device created successfully", "device": created })),
    )
}

async fn get_one(
    State(fake): State<Fake>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    fake.record("GET", format!("/devices/{id}"), &headers, None);
    if let Err(reply) = authorized(&headers) {
        return reply.into_response();
    }
    match id.as_str() {
        "broken" => (StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>").into_response(),
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Device with ID 'missing' not found." })),
        )
            .into_response(),
        _ => (StatusCode::OK, Json(device(&id, "on"))).into_response(),
    }
}

async fn update(
    State(fake): State<Fake>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    fake.record("PUT", format!("/devices/{id}"), &headers, Some(body.clone()));
    if let Err(reply) = authorized(&headers) {
        return reply;
    }
    let status = body["status"].as_str().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({ "message": "Device updated successfully", "device": device(&id, status) })),
    )
}

async fn delete(
    State(fake): State<Fake>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    fake.record("DELETE", format!("/devices/{id}"), &headers, None);
    if let Err(reply) = authorized(&headers) {
        return reply;
    }
    (
        StatusCode::OK,
        Json(json!({ "message": format!("Device {id} deleted successfully") })),
    )
}

async fn spawn(fake: Fake) -> String {
    let app = Router::new()
        .route("/devices", get(list).post(create))
        .route("/devices/{id}", get(get_one).put(update).delete(delete))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    // Trailing slash is trimmed by the client.
    format!("http://{addr}/")
}

async fn client(session: Arc<StaticSession>) -> (ApiClient, Fake) {
    let fake = Fake::default();
    let base = spawn(fake.clone()).await;
    (ApiClient::new(&base, session), fake)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_follows_pagination_with_bearer_token() {
    let (client, fake) = client(StaticSession::signed_in()).await;

    let devices = client.list_devices().await.unwrap();

    let ids: Vec<_> = devices.iter().map(|d| d.device_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_eq!(devices[0].last_updated.unwrap().timestamp(), 1_714_564_800);

    let paths: Vec<_> = fake.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        [
            "/devices",
            "/devices?exclusiveStartKey=a",
            "/devices?exclusiveStartKey=b"
        ]
    );
}

#[tokio::test]
async fn no_session_sends_nothing() {
    let (client, fake) = client(StaticSession::signed_out()).await;

    let err = client.list_devices().await.unwrap_err();

    assert!(err.is_no_current_user());
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn create_posts_json_body() {
    let (client, fake) = client(StaticSession::signed_in()).await;
    let device = NewDevice {
        device_id: None,
        name: "Lamp".to_owned(),
        device_type: "light".to_owned(),
        location: Some("Hall".to_owned()),
        status: "off".to_owned(),
        properties: serde_json::from_value(json!({ "watts": 60 })).unwrap(),
    };

    let resp = client.create_device(&device).await.unwrap();

    assert_eq!(resp.message.as_deref(), Some("Device created successfully"));
    assert_eq!(resp.device.unwrap().device_id, "generated-id");

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert!(requests[0]
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("application/json"));
    assert_eq!(
        requests[0].body,
        Some(json!({
            "name": "Lamp",
            "type": "light",
            "location": "Hall",
            "status": "off",
            "properties": { "watts": 60 }
        }))
    );
}

#[tokio::test]
async fn server_error_text_is_surfaced() {
    let (client, _fake) = client(StaticSession::signed_in()).await;
    let device = NewDevice {
        device_id: None,
        name: String::new(),
        device_type: "light".to_owned(),
        location: None,
        status: "off".to_owned(),
        properties: None,
    };

    let err = client.create_device(&device).await.unwrap_err();

    match err {
        RequestError::Api { status, message } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "Missing or empty required field: name");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn not_found_uses_error_field() {
    let (client, _fake) = client(StaticSession::signed_in()).await;

    let err = client.get_device("missing").await.unwrap_err();

    assert_eq!(err.to_string(), "Device with ID 'missing' not found.");
}

#[tokio::test]
async fn non_json_error_falls_back_to_status() {
    let (client, _fake) = client(StaticSession::signed_in()).await;

    let err = client.get_device("broken").await.unwrap_err();

    assert_eq!(err.to_string(), "HTTP 502");
}

#[tokio::test]
async fn update_sends_status_only_to_encoded_path() {
    let (client, fake) = client(StaticSession::signed_in()).await;

    let resp = client
        .update_device(
            "living room/1",
            &DeviceUpdate {
                status: "on".to_owned(),
            },
        )
        .await
        .unwrap();

    assert_eq!(resp.device.unwrap().status, "on");
    let requests = fake.requests();
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].path, "/devices/living room/1");
    assert_eq!(requests[0].body, Some(json!({ "status": "on" })));
}

#[tokio::test]
async fn delete_returns_message_without_device() {
    let (client, fake) = client(StaticSession::signed_in()).await;

    let resp = client.delete_device("lamp-1").await.unwrap();

    assert_eq!(resp.message.as_deref(), Some("Device lamp-1 deleted successfully"));
    assert!(resp.device.is_none());
    assert_eq!(fake.requests()[0].method, "DELETE");
    assert!(fake.requests()[0].body.is_none());
}
