use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::models::{DEFAULT_PUBLIC_PAGES, LocaleSet};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub i18n: I18nConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub static_config: StaticConfig,
    pub routes: RoutesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    pub default_locale: String,
    pub locales: Vec<String>,
    /// Directory with `{locale}.json` bundles; embedded bundles when unset
    pub bundle_dir: Option<String>,
    /// Land on the saved `lang` preference instead of the default at `/`
    pub prefer_saved_locale: bool,
    pub cache_bundles: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub api_base_url: String,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    pub enabled: bool,
    pub web_root: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// First path segments (after the locale) reachable without a session
    pub public_pages: Vec<String>,
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from the given path, or the first config.toml found
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load(explicit_path: Option<&str>) -> Result<Self, anyhow::Error> {
        let mut config = match explicit_path.map(str::to_string).or_else(Self::find_config_file) {
            Some(config_path) => {
                tracing::info!("Loading configuration from {}", config_path);
                Self::from_toml(&config_path)?
            },
            None => {
                tracing::warn!("Configuration file not found, using defaults");
                Config::default()
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_DATABASE_URL: preference store (default: sqlite://data/finance-web.db)
    /// - APP_DEFAULT_LOCALE: default locale code (e.g., "en")
    /// - APP_LOCALES: comma separated locale codes (e.g., "en,lo,th,jp")
    /// - APP_BUNDLE_DIR: read bundles from this directory instead of the binary
    /// - APP_AUTH_API_BASE_URL: finance API base url
    /// - APP_AUTH_REQUEST_TIMEOUT: accepts "10s", "1m" or plain seconds
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,finance_web=debug")
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(db_url) = std::env::var("APP_DATABASE_URL") {
            self.database.url = db_url;
            tracing::info!("Override database.url from env");
        }

        if let Ok(default_locale) = std::env::var("APP_DEFAULT_LOCALE") {
            self.i18n.default_locale = default_locale;
            tracing::info!("Override i18n.default_locale from env: {}", self.i18n.default_locale);
        }

        if let Ok(locales) = std::env::var("APP_LOCALES") {
            self.i18n.locales = split_list(&locales);
            tracing::info!("Override i18n.locales from env: {:?}", self.i18n.locales);
        }

        if let Ok(dir) = std::env::var("APP_BUNDLE_DIR") {
            tracing::info!("Override i18n.bundle_dir from env: {}", dir);
            self.i18n.bundle_dir = Some(dir);
        }

        if let Ok(url) = std::env::var("APP_AUTH_API_BASE_URL") {
            self.auth.api_base_url = url;
            tracing::info!("Override auth.api_base_url from env: {}", self.auth.api_base_url);
        }

        if let Ok(timeout) = std::env::var("APP_AUTH_REQUEST_TIMEOUT") {
            match parse_duration_to_secs(&timeout) {
                Ok(val) => {
                    self.auth.request_timeout = val;
                    tracing::info!(
                        "Override auth.request_timeout from env: {}s",
                        self.auth.request_timeout
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_AUTH_REQUEST_TIMEOUT '{}': {} (keep {}s)",
                    timeout,
                    e,
                    self.auth.request_timeout
                ),
            }
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.auth.api_base_url.trim().is_empty() {
            anyhow::bail!("auth.api_base_url cannot be empty");
        }

        if self.auth.request_timeout == 0 {
            anyhow::bail!("auth.request_timeout must be > 0");
        }

        self.locale_set()?;

        Ok(())
    }

    /// The configured locale set; fails when the default is not a member
    pub fn locale_set(&self) -> Result<LocaleSet, anyhow::Error> {
        LocaleSet::new(&self.i18n.locales, &self.i18n.default_locale)
            .map_err(|e| anyhow::anyhow!("Invalid i18n configuration: {}", e))
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth.request_timeout)
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        possible_paths
            .iter()
            .find(|path| Path::new(path).exists())
            .map(|path| path.to_string())
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://data/finance-web.db".to_string() }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            locales: ["en", "lo", "th", "jp"].into_iter().map(String::from).collect(),
            bundle_dir: None,
            prefer_saved_locale: false,
            cache_bundles: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { api_base_url: "http://localhost:3000/api".to_string(), request_timeout: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,finance_web=debug".to_string(), file: Some("logs/finance-web.log".to_string()) }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self { enabled: false, web_root: "public".to_string() }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self { public_pages: DEFAULT_PUBLIC_PAGES.iter().map(|page| page.to_string()).collect() }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Plain numbers are seconds
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Ok(n),
        "m" | "min" | "mins" | "minute" | "minutes" => Ok(n * 60),
        "h" | "hr" | "hour" | "hours" => Ok(n * 60 * 60),
        _ => Err(format!("unsupported unit: {}", unit)),
    }
}

fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '10s', '1m'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}
