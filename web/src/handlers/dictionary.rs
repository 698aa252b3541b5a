use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use crate::AppState;
use crate::models::Dictionary;
use crate::utils::ApiResult;

/// Translation bundle for a locale, default bundle for anything unsupported
#[utoipa::path(
    get,
    path = "/api/dictionaries/{locale}",
    params(("locale" = String, Path, description = "Locale code, e.g. th")),
    responses(
        (status = 200, description = "Nested key to string map"),
        (status = 500, description = "Default dictionary unavailable"),
    ),
    tag = "Locale"
)]
pub async fn get_dictionary(
    State(state): State<Arc<AppState>>,
    Path(locale): Path<String>,
) -> ApiResult<Json<Dictionary>> {
    let dictionary = state.dictionaries.load_dictionary(Some(&locale)).await?;
    Ok(Json(Dictionary::clone(&dictionary)))
}
