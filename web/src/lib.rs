pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use services::{
    AuthBackend, BundleSource, DictionaryService, DirectoryBundles, DurableStorage,
    EmbeddedBundles, HttpAuthBackend, LocaleResolver, PageService, SessionService, SqliteStorage,
};

rust_i18n::i18n!("locales", fallback = "en");

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::session::login,
        handlers::session::register,
        handlers::session::logout,
        handlers::session::current_session,
        handlers::locale::switch_locale,
        handlers::locale::current_locale,
        handlers::dictionary::get_dictionary,
        handlers::page::show_page,
    ),
    components(
        schemas(
            models::LoginRequest,
            models::LoginResponse,
            models::RegisterRequest,
            models::RegisterResponse,
            models::SessionStateResponse,
            models::User,
            models::PageView,
            models::NavItem,
            models::RouteClass,
            handlers::locale::SwitchLocaleRequest,
            handlers::locale::SwitchLocaleResponse,
            handlers::locale::LocaleInfo,
        )
    ),
    tags(
        (name = "Session", description = "Sign in, registration and session state"),
        (name = "Locale", description = "Locale switching and translation dictionaries"),
        (name = "Pages", description = "Localized page mounts behind the session gate"),
    ),
    info(
        title = "Finance Web API",
        version = "1.0.0",
        description = "Localized web shell for the personal finance application"
    )
)]
pub struct ApiDoc;

/// Shared services for one running client profile.
pub struct AppState {
    pub config: Config,
    pub resolver: Arc<LocaleResolver>,
    pub dictionaries: Arc<DictionaryService>,
    pub sessions: Arc<SessionService>,
    pub pages: Arc<PageService>,
}

impl AppState {
    /// Production wiring: SQLite preferences, configured bundles, HTTP auth backend.
    pub fn from_config(config: Config, pool: SqlitePool) -> Result<Self, anyhow::Error> {
        let storage: Arc<dyn DurableStorage> = Arc::new(SqliteStorage::new(pool));

        let bundles: Arc<dyn BundleSource> = match &config.i18n.bundle_dir {
            Some(dir) => Arc::new(DirectoryBundles::new(dir)),
            None => Arc::new(EmbeddedBundles),
        };

        let backend: Arc<dyn AuthBackend> =
            Arc::new(HttpAuthBackend::new(config.auth.api_base_url.clone(), config.auth_timeout())?);

        Self::assemble(config, storage, bundles, backend)
    }

    pub fn assemble(
        config: Config,
        storage: Arc<dyn DurableStorage>,
        bundles: Arc<dyn BundleSource>,
        backend: Arc<dyn AuthBackend>,
    ) -> Result<Self, anyhow::Error> {
        let locales = config.locale_set()?;
        tracing::info!("Dictionary bundles: {}", bundles.describe());

        let resolver = Arc::new(LocaleResolver::new(
            locales.clone(),
            storage.clone(),
            config.i18n.prefer_saved_locale,
        ));
        let dictionaries =
            Arc::new(DictionaryService::new(locales, bundles, config.i18n.cache_bundles));
        let sessions = Arc::new(SessionService::new(storage, backend));
        let pages = Arc::new(PageService::new(
            resolver.clone(),
            dictionaries.clone(),
            sessions.clone(),
            config.routes.public_pages.clone(),
        ));

        Ok(Self { config, resolver, dictionaries, sessions, pages })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/session", get(handlers::session::current_session))
        .route("/api/session/login", post(handlers::session::login))
        .route("/api/session/register", post(handlers::session::register))
        .route("/api/session/logout", post(handlers::session::logout))
        .route(
            "/api/locale",
            get(handlers::locale::current_locale).put(handlers::locale::switch_locale),
        )
        .route("/api/dictionaries/:locale", get(handlers::dictionary::get_dictionary))
        .with_state(state.clone());

    let page_routes = Router::new()
        .route("/:lang", get(handlers::page::show_page))
        .route("/:lang/", get(handlers::page::show_page))
        .route("/:lang/*rest", get(handlers::page::show_page))
        .route_layer(axum_middleware::from_fn_with_state(
            state.pages.clone(),
            middleware::page_gate_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::page::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_routes)
        .merge(page_routes);

    if state.config.static_config.enabled {
        tracing::info!("Serving static assets from {}", state.config.static_config.web_root);
        app = app.nest_service("/static", ServeDir::new(&state.config.static_config.web_root));
    }

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    app.fallback(handlers::page::not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.resolver.clone(),
            middleware::locale_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
