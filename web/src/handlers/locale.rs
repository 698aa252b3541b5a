use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::AppState;
use crate::utils::ApiResult;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SwitchLocaleRequest {
    pub locale: String,
    /// Path currently displayed, e.g. `/th/dashboard`
    pub path: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SwitchLocaleResponse {
    pub locale: String,
    pub location: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocaleQuery {
    /// Path to resolve, `/` when omitted
    pub path: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocaleInfo {
    pub current: String,
    pub default: String,
    pub supported: Vec<String>,
    pub saved_preference: Option<String>,
}

/// Switch language, keeping the current sub-path
#[utoipa::path(
    put,
    path = "/api/locale",
    request_body = SwitchLocaleRequest,
    responses(
        (status = 200, description = "Locale switched", body = SwitchLocaleResponse),
        (status = 400, description = "Unsupported locale"),
    ),
    tag = "Locale"
)]
pub async fn switch_locale(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SwitchLocaleRequest>,
) -> ApiResult<Json<SwitchLocaleResponse>> {
    let location = state.resolver.switch_locale(&payload.locale, &payload.path).await?;
    Ok(Json(SwitchLocaleResponse { locale: payload.locale.trim().to_string(), location }))
}

/// Locale shown for a path, with the supported set and saved preference
#[utoipa::path(
    get,
    path = "/api/locale",
    params(LocaleQuery),
    responses(
        (status = 200, description = "Locale information", body = LocaleInfo)
    ),
    tag = "Locale"
)]
pub async fn current_locale(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocaleQuery>,
) -> Json<LocaleInfo> {
    let locales = state.resolver.locales();
    let current = state.resolver.resolve_current_locale(query.path.as_deref().unwrap_or("/"));
    let saved = state.resolver.saved_preference().await;

    Json(LocaleInfo {
        current: current.to_string(),
        default: locales.default_locale().to_string(),
        supported: locales.locales().iter().map(ToString::to_string).collect(),
        saved_preference: saved.map(|locale| locale.to_string()),
    })
}
