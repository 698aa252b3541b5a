use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::{OnceCell, RwLock};

use crate::models::{Dictionary, Locale, LocaleSet, SchemaViolation};
use crate::services::bundle_source::{BundleError, BundleSource};
use crate::utils::{ApiError, ApiResult};

type BundleCache = DashMap<Locale, Arc<OnceCell<Arc<Dictionary>>>>;

/// A non-default bundle that is missing or drifted from the default schema.
#[derive(Debug)]
pub struct BundleIssue {
    pub locale: Locale,
    pub problem: String,
}

/// Resolves locales to dictionaries, falling back to the default bundle.
pub struct DictionaryService {
    locales: LocaleSet,
    source: Arc<dyn BundleSource>,
    cache: Option<BundleCache>,
}

impl DictionaryService {
    pub fn new(locales: LocaleSet, source: Arc<dyn BundleSource>, cache_bundles: bool) -> Self {
        tracing::info!(
            "Dictionary loader using {} (cache {})",
            source.describe(),
            if cache_bundles { "enabled" } else { "disabled" }
        );
        Self { locales, source, cache: cache_bundles.then(DashMap::new) }
    }

    pub fn locales(&self) -> &LocaleSet {
        &self.locales
    }

    /// Load the dictionary for `requested`.
    ///
    /// Empty, unsupported and unloadable locales all yield the default bundle.
    /// Only a failure of the default bundle itself is returned as an error.
    pub async fn load_dictionary(&self, requested: Option<&str>) -> ApiResult<Arc<Dictionary>> {
        let Some(code) = requested.map(str::trim).filter(|code| !code.is_empty()) else {
            return self.load_default().await;
        };

        let Some(locale) = self.locales.get(code) else {
            tracing::warn!(
                "Dictionary requested for unsupported locale '{}', serving '{}'",
                code,
                self.locales.default_locale()
            );
            return self.load_default().await;
        };

        if locale == self.locales.default_locale() {
            return self.load_default().await;
        }

        match self.load_cached(locale).await {
            Ok(dictionary) => Ok(dictionary),
            Err(err) => {
                tracing::warn!(
                    "Failed to load dictionary for '{}': {}; falling back to '{}'",
                    locale,
                    err,
                    self.locales.default_locale()
                );
                self.load_default().await
            },
        }
    }

    pub async fn load_default(&self) -> ApiResult<Arc<Dictionary>> {
        let default = self.locales.default_locale();
        self.load_cached(default).await.map_err(|err| {
            tracing::error!("Default dictionary '{}' could not be loaded: {}", default, err);
            ApiError::dictionary_unavailable(err.to_string())
        })
    }

    /// Startup check: the default bundle must load, there is nothing to fall back to.
    pub async fn preload_default(&self) -> ApiResult<()> {
        let dictionary = self.load_default().await?;
        tracing::info!(
            "Loaded default dictionary '{}' ({} keys)",
            self.locales.default_locale(),
            dictionary.leaf_count()
        );
        Ok(())
    }

    /// Check every non-default bundle against the default one.
    pub async fn validate_bundles(&self) -> ApiResult<Vec<BundleIssue>> {
        let baseline = self.load_default().await?;
        let mut issues = Vec::new();

        for locale in self.locales.locales() {
            if locale == self.locales.default_locale() {
                continue;
            }
            match self.source.load(locale).await {
                Ok(dictionary) => {
                    issues.extend(dictionary.check_subset_of(&baseline).into_iter().map(
                        |violation: SchemaViolation| BundleIssue {
                            locale: locale.clone(),
                            problem: violation.to_string(),
                        },
                    ));
                },
                Err(err) => {
                    issues.push(BundleIssue { locale: locale.clone(), problem: err.to_string() })
                },
            }
        }

        Ok(issues)
    }

    /// Concurrent loads of one locale share a single source call; failures are not cached.
    async fn load_cached(&self, locale: &Locale) -> Result<Arc<Dictionary>, BundleError> {
        let Some(cache) = &self.cache else {
            return self.source.load(locale).await.map(Arc::new);
        };

        let cell = Arc::clone(&cache.entry(locale.clone()).or_default());
        cell.get_or_try_init(|| async {
            tracing::debug!("Loading dictionary bundle '{}'", locale);
            self.source.load(locale).await.map(Arc::new)
        })
        .await
        .cloned()
    }
}

struct ActiveState {
    locale: Option<Locale>,
    dictionary: Arc<Dictionary>,
}

/// The dictionary currently on display, guarded against late resolution.
///
/// Each [`ActiveDictionary::navigate`] call takes a new generation number; a
/// load only commits if no newer navigation started while it was in flight.
pub struct ActiveDictionary {
    service: Arc<DictionaryService>,
    generation: AtomicU64,
    state: RwLock<ActiveState>,
}

impl ActiveDictionary {
    pub fn new(service: Arc<DictionaryService>) -> Self {
        Self {
            service,
            generation: AtomicU64::new(0),
            state: RwLock::new(ActiveState { locale: None, dictionary: Arc::new(Dictionary::empty()) }),
        }
    }

    /// Returns `false` when the result was discarded as stale.
    pub async fn navigate(&self, locale: &str) -> ApiResult<bool> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let dictionary = self.service.load_dictionary(Some(locale)).await?;

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!("Discarding stale dictionary for '{}'", locale);
            return Ok(false);
        }
        state.locale = Some(self.service.locales().resolve(Some(locale)));
        state.dictionary = dictionary;
        Ok(true)
    }

    /// `None` and an empty dictionary until the first navigation commits.
    pub async fn current(&self) -> (Option<Locale>, Arc<Dictionary>) {
        let state = self.state.read().await;
        (state.locale.clone(), Arc::clone(&state.dictionary))
    }
}
