//! Locale middleware
//!
//! Page paths without a supported locale prefix are redirected under one.
//! Every request then runs with a request locale for localized errors: the
//! path prefix for pages, the Accept-Language header for everything else.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::ACCEPT_LANGUAGE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::services::LocaleResolver;
use crate::utils::{locale_from_accept_language, scope_locale};

/// Paths that are not pages and never get a locale prefix.
const BYPASS_PREFIXES: &[&str] =
    &["/api", "/api-docs", "/swagger-ui", "/static", "/health", "/favicon.ico"];

pub fn is_bypassed(path: &str) -> bool {
    BYPASS_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

pub async fn locale_middleware(
    State(resolver): State<Arc<LocaleResolver>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    if is_bypassed(&path) {
        let header = req.headers().get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
        let locale = locale_from_accept_language(header, resolver.locales());
        return scope_locale(&locale, next.run(req)).await;
    }

    if let Some(mut target) = resolver.redirect_for(&path).await {
        if let Some(query) = req.uri().query() {
            target.push('?');
            target.push_str(query);
        }
        tracing::debug!("Redirecting {} to {}", path, target);
        return Redirect::temporary(&target).into_response();
    }

    let locale = resolver.resolve_current_locale(&path);
    scope_locale(&locale, next.run(req)).await
}
