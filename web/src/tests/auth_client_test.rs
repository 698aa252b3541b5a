use std::time::Duration;

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::post};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::models::UserId;
use crate::services::auth_client::{ApiEnvelope, AuthPayload};
use crate::services::{AuthBackend, AuthClientError, HttpAuthBackend, NewUser};

async fn fake_login(Json(body): Json<Value>) -> impl IntoResponse {
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some("alice@example.com"), Some("secret123")) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "data": {
                    "user": { "id": 7, "name": "alice", "email": "alice@example.com", "plan": "pro" },
                    "accessToken": "jwt-alice"
                }
            })),
        ),
        (Some("soft@example.com"), _) => (
            StatusCode::OK,
            Json(json!({ "status": "error", "message": "Account locked" })),
        ),
        (Some("empty@example.com"), _) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "data": { "user": { "id": "u-1", "email": "empty@example.com" }, "accessToken": "" }
            })),
        ),
        (Some("boom@example.com"), _) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "message": "database down" })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "status": "error", "message": "Invalid email or password" })),
        ),
    }
}

async fn fake_register(Json(body): Json<Value>) -> impl IntoResponse {
    if body["main_currency"].as_str().is_none() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "status": "error", "message": "currency missing" })));
    }

    match body["username"].as_str() {
        Some("taken") => (
            StatusCode::CONFLICT,
            Json(json!({ "status": "error", "message": "Username already exists" })),
        ),
        Some("instant") => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "Welcome",
                "data": {
                    "user": { "id": 8, "username": "instant", "email": body["email"] },
                    "accessToken": "jwt-instant"
                }
            })),
        ),
        _ => (StatusCode::OK, Json(json!({ "status": "success", "message": "User created" }))),
    }
}

/// Serve the fake finance API on an ephemeral port and return its base url.
async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/users/login", post(fake_login))
        .route("/users/register", post(fake_register));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/", addr)
}

fn client(base_url: &str) -> HttpAuthBackend {
    HttpAuthBackend::new(base_url, Duration::from_secs(5)).unwrap()
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        main_currency: "LAK".to_string(),
        password: "hunter22".to_string(),
    }
}

#[tokio::test]
async fn test_login_success_builds_session() {
    let backend = client(&spawn_backend().await);

    let session = backend.login("alice@example.com", "secret123").await.unwrap();
    assert_eq!(session.token, "jwt-alice");
    assert_eq!(session.user.id, UserId::Number(7));
    assert_eq!(session.user.username, "alice");
    assert_eq!(session.user.profile.get("plan"), Some(&json!("pro")));
}

#[tokio::test]
async fn test_login_rejections() {
    let backend = client(&spawn_backend().await);

    match backend.login("alice@example.com", "nope").await {
        Err(AuthClientError::Rejected(message)) => assert_eq!(message, "Invalid email or password"),
        other => panic!("unexpected result: {:?}", other),
    }
    match backend.login("soft@example.com", "whatever").await {
        Err(AuthClientError::Rejected(message)) => assert_eq!(message, "Account locked"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_login_server_failures_are_not_rejections() {
    let backend = client(&spawn_backend().await);

    assert!(matches!(
        backend.login("boom@example.com", "whatever").await,
        Err(AuthClientError::InvalidResponse(_))
    ));
    assert!(matches!(
        backend.login("empty@example.com", "whatever").await,
        Err(AuthClientError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = client(&format!("http://{}", addr));
    assert!(matches!(
        backend.login("alice@example.com", "secret123").await,
        Err(AuthClientError::Network(_))
    ));
}

#[tokio::test]
async fn test_register_outcomes() {
    let backend = client(&spawn_backend().await);

    let outcome = backend.register(&new_user("bob")).await.unwrap();
    assert_eq!(outcome.status, "success");
    assert_eq!(outcome.message.as_deref(), Some("User created"));
    assert!(outcome.session.is_none());

    let outcome = backend.register(&new_user("instant")).await.unwrap();
    let session = outcome.session.expect("backend signed the user in");
    assert_eq!(session.token, "jwt-instant");
    assert_eq!(session.user.email, "instant@example.com");

    match backend.register(&new_user("taken")).await {
        Err(AuthClientError::Rejected(message)) => assert_eq!(message, "Username already exists"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_envelope_without_message_or_data() {
    let bare: ApiEnvelope<AuthPayload> = serde_json::from_value(json!({ "status": "success" })).unwrap();
    assert_eq!(bare.status, "success");
    assert!(bare.message.is_none());
    assert!(bare.data.is_none());

    let full: ApiEnvelope<AuthPayload> = serde_json::from_value(json!({
        "status": "success",
        "message": "ok",
        "data": { "user": { "id": 1, "username": "alice", "email": "alice@example.com" }, "accessToken": "t" }
    }))
    .unwrap();
    assert_eq!(full.message.as_deref(), Some("ok"));
    assert_eq!(full.data.unwrap().access_token, "t");
}
