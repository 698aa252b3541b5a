use std::sync::Arc;

use axum::{Json, extract::State};
use validator::Validate;

use crate::AppState;
use crate::models::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, SessionStateResponse,
};
use crate::utils::ApiResult;

/// Sign in against the finance API and store the session
#[utoipa::path(
    post,
    path = "/api/session/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 502, description = "Authentication service unavailable"),
    ),
    tag = "Session"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    payload.validate()?;
    tracing::info!("Login attempt for {}", payload.email);

    let session = state.sessions.login(&payload.email, &payload.password).await?;
    Ok(Json(LoginResponse { user: session.user, token: session.token }))
}

/// Create an account; signs in when the API returns credentials
#[utoipa::path(
    post,
    path = "/api/session/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = RegisterResponse),
        (status = 400, description = "Validation failed"),
        (status = 502, description = "Authentication service unavailable"),
    ),
    tag = "Session"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    payload.validate()?;
    tracing::info!("Registering user: {}", payload.username);

    let response = state
        .sessions
        .register(
            &payload.username,
            &payload.email,
            payload.main_currency.as_deref(),
            &payload.password,
        )
        .await?;
    Ok(Json(response))
}

/// Clear the session (idempotent)
#[utoipa::path(
    post,
    path = "/api/session/logout",
    responses(
        (status = 200, description = "Signed out", body = SessionStateResponse)
    ),
    tag = "Session"
)]
pub async fn logout(State(state): State<Arc<AppState>>) -> Json<SessionStateResponse> {
    state.sessions.logout().await;
    Json(SessionStateResponse::from(None))
}

/// Current session state, after rehydration has completed
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Session state", body = SessionStateResponse)
    ),
    tag = "Session"
)]
pub async fn current_session(State(state): State<Arc<AppState>>) -> Json<SessionStateResponse> {
    state.sessions.wait_hydrated().await;
    Json(SessionStateResponse::from(state.sessions.current().await))
}
