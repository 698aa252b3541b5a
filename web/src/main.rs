use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use finance_web::config::{Config, LoggingConfig};
use finance_web::{AppState, build_router};

#[derive(Debug, Parser)]
#[command(name = "finance-web", version, about = "Localized web shell for the finance app")]
struct Args {
    /// Path to config.toml; searched in conf/ and the working directory when omitted
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let _guard = init_logging(&config.logging)?;
    tracing::info!("Starting finance-web v{}", env!("CARGO_PKG_VERSION"));

    let pool = connect_database(&config.database.url).await?;
    sqlx::migrate!().run(&pool).await.context("Failed to run database migrations")?;
    tracing::info!("Database ready: {}", config.database.url);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::from_config(config, pool)?);

    // Rehydrate before serving; a broken store leaves the profile signed out.
    if let Err(e) = state.sessions.init().await {
        tracing::warn!("Session rehydration failed, continuing signed out: {}", e);
    }

    state
        .dictionaries
        .preload_default()
        .await
        .context("Failed to load the default dictionary")?;

    for issue in state.dictionaries.validate_bundles().await? {
        tracing::warn!("Bundle '{}' is inconsistent: {}", issue.locale, issue.problem);
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API documentation at http://{}/swagger-ui", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid logging.level")?;

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match &logging.file {
        Some(file) => {
            let path = Path::new(file);
            let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path.file_name().and_then(|name| name.to_str()).unwrap_or("finance-web.log");
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
            registry
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        },
        None => {
            registry.init();
            Ok(None)
        },
    }
}

async fn connect_database(url: &str) -> anyhow::Result<sqlx::SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database url {}", url))?
        .create_if_missing(true);

    if let Some(parent) = database_file(url).and_then(Path::parent)
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("Failed to connect to the database")
}

/// File behind a `sqlite:` url; `None` for in-memory databases.
fn database_file(url: &str) -> Option<&Path> {
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let file = rest.split('?').next().unwrap_or(rest);
    (!file.is_empty() && file != ":memory:").then(|| Path::new(file))
}
