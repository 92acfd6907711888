use axum::{
    Router,
    body::Body,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header::AUTHORIZATION},
};
use serde_json::{Value, json};
use std::sync::Once;
use tower::ServiceExt;
use tracing::{Level, info};
use tracing_subscriber::fmt::format::FmtSpan;

use crate::{AppState, create_router, models::user::Role, services::jwt_service::JwtService};

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_BODY_LIMIT: usize = 16 * 1024;

static INIT: Once = Once::new();

/// Initialize logging exactly once
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_target(false)
            .with_thread_ids(true)
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_max_level(Level::ERROR)
            .with_span_events(FmtSpan::NONE)
            .init();
    });
}

pub fn create_test_state() -> AppState {
    init_tracing();
    AppState::new(JwtService::new(TEST_SECRET), TEST_BODY_LIMIT)
}

pub fn create_test_app() -> (Router, AppState) {
    let state = create_test_state();
    let app = create_router(state.clone());
    info!("Test application created");
    (app, state)
}

pub fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

pub async fn test_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: Option<HeaderMap>,
) -> (StatusCode, Value) {
    info!(method = %method, uri = %uri, "Making test request");

    let body = match body {
        Some(json) => Body::from(serde_json::to_string(&json).unwrap()),
        None => Body::empty(),
    };

    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(custom_headers) = headers {
        for (key, value) in custom_headers.iter() {
            request = request.header(key, value);
        }
    }

    let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    info!(status = %status, body = %body, "Test response received");
    (status, body)
}

/// Registers (unless already present) and logs in, returning the login body.
pub async fn login(app: &Router, email: &str, password: &str) -> Value {
    let credentials = json!({ "email": email, "password": password });

    test_request(app.clone(), "POST", "/auth/register", Some(credentials.clone()), None).await;
    let (status, body) =
        test_request(app.clone(), "POST", "/auth/login", Some(credentials), None).await;
    assert_eq!(status, StatusCode::OK);
    body
}

pub async fn access_token(app: &Router, email: &str, password: &str) -> String {
    login(app, email, password).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Creates an admin account directly through the service and returns an
/// access token for it.
pub async fn admin_token(app: &Router, state: &AppState) -> String {
    state
        .auth_service
        .create_user_with_role("admin@x.com", "admin-secret", Role::Admin)
        .await
        .unwrap();
    access_token(app, "admin@x.com", "admin-secret").await
}
