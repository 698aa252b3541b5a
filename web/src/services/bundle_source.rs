use std::path::PathBuf;

use async_trait::async_trait;
use rust_embed::RustEmbed;
use thiserror::Error;

use crate::models::{Dictionary, DictionaryError, Locale};

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("no dictionary bundle for locale '{0}'")]
    Missing(String),

    #[error("failed to read dictionary bundle {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dictionary bundle for locale '{locale}': {source}")]
    Malformed {
        locale: String,
        #[source]
        source: DictionaryError,
    },
}

/// Where translation bundles come from.
#[async_trait]
pub trait BundleSource: Send + Sync {
    async fn load(&self, locale: &Locale) -> Result<Dictionary, BundleError>;

    fn describe(&self) -> String;
}

fn parse(locale: &Locale, bytes: &[u8]) -> Result<Dictionary, BundleError> {
    Dictionary::from_json(bytes)
        .map_err(|source| BundleError::Malformed { locale: locale.to_string(), source })
}

#[derive(RustEmbed)]
#[folder = "bundles/"]
struct BundleAssets;

/// Bundles compiled into the binary from `web/bundles/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedBundles;

impl EmbeddedBundles {
    /// Locale codes that have an embedded bundle.
    pub fn available() -> Vec<String> {
        let mut codes: Vec<String> = BundleAssets::iter()
            .filter_map(|name| name.strip_suffix(".json").map(str::to_string))
            .collect();
        codes.sort();
        codes
    }
}

#[async_trait]
impl BundleSource for EmbeddedBundles {
    async fn load(&self, locale: &Locale) -> Result<Dictionary, BundleError> {
        let file = BundleAssets::get(&format!("{}.json", locale))
            .ok_or_else(|| BundleError::Missing(locale.to_string()))?;
        parse(locale, &file.data)
    }

    fn describe(&self) -> String {
        "embedded bundles".to_string()
    }
}

/// Bundles read from `{root}/{locale}.json` on every load.
#[derive(Debug, Clone)]
pub struct DirectoryBundles {
    root: PathBuf,
}

impl DirectoryBundles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BundleSource for DirectoryBundles {
    async fn load(&self, locale: &Locale) -> Result<Dictionary, BundleError> {
        let path = self.root.join(format!("{}.json", locale));
        let bytes = tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                BundleError::Missing(locale.to_string())
            } else {
                BundleError::Io { path: path.display().to_string(), source }
            }
        })?;
        parse(locale, &bytes)
    }

    fn describe(&self) -> String {
        format!("bundle directory {}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocaleSet;

    #[test]
    fn test_embedded_bundles_cover_default_locales() {
        assert_eq!(EmbeddedBundles::available(), vec!["en", "jp", "lo", "th"]);
    }

    #[tokio::test]
    async fn test_embedded_bundle_loads() {
        let locales = LocaleSet::new(["en", "lo", "th", "jp"], "en").unwrap();
        let dict = EmbeddedBundles.load(locales.default_locale()).await.unwrap();
        assert!(dict.get("appTitle").is_some());
        assert!(dict.get("sidebar.logout").is_some());
    }

    #[tokio::test]
    async fn test_directory_bundles_missing_file() {
        let locales = LocaleSet::new(["en", "xx"], "en").unwrap();
        let source = DirectoryBundles::new(std::env::temp_dir().join("finance-web-no-such-dir"));
        let err = source.load(locales.get("xx").unwrap()).await.unwrap_err();
        assert!(matches!(err, BundleError::Missing(code) if code == "xx"));
    }
}
