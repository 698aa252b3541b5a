use std::sync::Arc;

use axum::{Extension, Json, http::Uri};

use crate::models::PageView;
use crate::utils::{ApiError, ApiResult};

/// Page envelope produced by the page gate
#[utoipa::path(
    get,
    path = "/{locale}/{page}",
    params(
        ("locale" = String, Path, description = "Locale prefix"),
        ("page" = String, Path, description = "Page path, e.g. dashboard"),
    ),
    responses(
        (status = 200, description = "Page view", body = PageView),
        (status = 303, description = "No session, redirect to the login page"),
    ),
    tag = "Pages"
)]
pub async fn show_page(Extension(view): Extension<Arc<PageView>>) -> Json<PageView> {
    Json(PageView::clone(&view))
}

pub async fn not_found(uri: Uri) -> ApiResult<()> {
    Err(ApiError::not_found(uri.path().to_string()))
}

pub async fn health() -> &'static str {
    "OK"
}
