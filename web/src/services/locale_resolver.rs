use std::sync::Arc;

use crate::models::{Locale, LocaleSet};
use crate::services::storage::{DurableStorage, LOCALE_PREFERENCE_KEY};
use crate::utils::{ApiError, ApiResult};

/// Split `path` into its leading supported locale and the remaining sub-path.
///
/// The locale segment must be followed by `/`, `?`, `#` or the end of the path,
/// so `en` does not match `/enrollment`. The sub-path keeps its leading `/`.
pub fn split_locale<'a, 'p>(locales: &'a LocaleSet, path: &'p str) -> (Option<&'a Locale>, &'p str) {
    let Some(trimmed) = path.strip_prefix('/') else {
        return (None, path);
    };
    let end = trimmed.find(['/', '?', '#']).unwrap_or(trimmed.len());
    match locales.get(&trimmed[..end]) {
        Some(locale) => (Some(locale), &trimmed[end..]),
        None => (None, path),
    }
}

/// Keeps every page URL under a supported locale prefix and tracks the
/// persisted locale preference.
///
/// The URL decides the active locale; storage only remembers the last choice.
pub struct LocaleResolver {
    locales: LocaleSet,
    storage: Arc<dyn DurableStorage>,
    prefer_saved_locale: bool,
}

impl LocaleResolver {
    pub fn new(locales: LocaleSet, storage: Arc<dyn DurableStorage>, prefer_saved_locale: bool) -> Self {
        Self { locales, storage, prefer_saved_locale }
    }

    pub fn locales(&self) -> &LocaleSet {
        &self.locales
    }

    /// Redirect target for a path without a locale prefix, `None` if it already has one.
    ///
    /// Unknown leading segments are kept: `/xx/foo` becomes `/{default}/xx/foo`.
    pub fn normalize_path(&self, path: &str) -> Option<String> {
        let default = self.locales.default_locale();
        if path.is_empty() || path == "/" {
            return Some(format!("/{}", default));
        }
        match split_locale(&self.locales, path) {
            (Some(_), _) => None,
            (None, _) if path.starts_with('/') => Some(format!("/{}{}", default, path)),
            (None, _) => Some(format!("/{}/{}", default, path)),
        }
    }

    /// Like [`normalize_path`](Self::normalize_path), but the bare root may land
    /// on the saved preference when configured to.
    pub async fn redirect_for(&self, path: &str) -> Option<String> {
        if path.is_empty() || path == "/" {
            return Some(format!("/{}", self.landing_locale().await));
        }
        self.normalize_path(path)
    }

    /// Active locale from the first path segment, default when absent or unknown.
    pub fn resolve_current_locale(&self, path: &str) -> Locale {
        split_locale(&self.locales, path)
            .0
            .unwrap_or(self.locales.default_locale())
            .clone()
    }

    /// Persist `new_locale` and return the current sub-path under its prefix.
    pub async fn switch_locale(&self, new_locale: &str, current_path: &str) -> ApiResult<String> {
        let locale = self.locales.get(new_locale.trim()).ok_or_else(|| {
            ApiError::invalid_input(format!("Unsupported locale '{}'", new_locale))
        })?;

        self.storage.set(LOCALE_PREFERENCE_KEY, locale.as_str()).await?;

        let target = match split_locale(&self.locales, current_path) {
            (_, "") | (None, "/") => format!("/{}", locale),
            (_, rest) if rest.starts_with(['/', '?', '#']) => format!("/{}{}", locale, rest),
            (_, rest) => format!("/{}/{}", locale, rest),
        };

        tracing::info!("Switched locale to '{}' ({})", locale, target);
        Ok(target)
    }

    /// Last locale chosen through [`switch_locale`](Self::switch_locale), if still supported.
    pub async fn saved_preference(&self) -> Option<Locale> {
        match self.storage.get(LOCALE_PREFERENCE_KEY).await {
            Ok(Some(code)) => {
                let locale = self.locales.get(&code).cloned();
                if locale.is_none() {
                    tracing::debug!("Ignoring unsupported saved locale '{}'", code);
                }
                locale
            },
            Ok(None) => None,
            Err(err) => {
                tracing::warn!("Failed to read locale preference: {}", err);
                None
            },
        }
    }

    /// Locale for the bare root path.
    pub async fn landing_locale(&self) -> Locale {
        if self.prefer_saved_locale
            && let Some(saved) = self.saved_preference().await
        {
            return saved;
        }
        self.locales.default_locale().clone()
    }
}
