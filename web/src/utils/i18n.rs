//! Request-scoped locale for server-side messages
//!
//! The locale middleware runs every request inside [`scope_locale`], so error
//! responses can be localized without threading the locale through handlers.

use std::future::Future;

use crate::models::{Locale, LocaleSet};

tokio::task_local! {
    static REQUEST_LOCALE: String;
}

/// Used for messages produced outside any request, e.g. during startup.
pub const FALLBACK_LOCALE: &str = "en";

/// Browser tags that map onto a differently spelled supported code.
const TAG_ALIASES: &[(&str, &str)] = &[("ja", "jp")];

/// Run `fut` with `locale` as the current request locale.
pub async fn scope_locale<F: Future>(locale: &Locale, fut: F) -> F::Output {
    REQUEST_LOCALE.scope(locale.as_str().to_string(), fut).await
}

/// Locale of the request being served, or [`FALLBACK_LOCALE`].
pub fn current_locale() -> String {
    REQUEST_LOCALE
        .try_with(Clone::clone)
        .unwrap_or_else(|_| FALLBACK_LOCALE.to_string())
}

/// Pick the first supported locale from an Accept-Language header value.
/// Accepts: "th", "th-TH", "th_TH", "ja-JP,en;q=0.8", etc.
pub fn locale_from_accept_language(header_value: Option<&str>, locales: &LocaleSet) -> Locale {
    header_value
        .into_iter()
        .flat_map(|value| value.split(','))
        .filter_map(|part| part.split(';').next())
        .find_map(|tag| match_tag(tag, locales))
        .unwrap_or_else(|| locales.default_locale().clone())
}

fn match_tag(tag: &str, locales: &LocaleSet) -> Option<Locale> {
    let tag = tag.trim().to_lowercase().replace('_', "-");
    if tag.is_empty() {
        return None;
    }
    if let Some(locale) = locales.get(&tag) {
        return Some(locale.clone());
    }

    let primary = tag.split('-').next().unwrap_or(&tag);
    let primary = TAG_ALIASES
        .iter()
        .find(|(alias, _)| *alias == primary)
        .map_or(primary, |(_, code)| *code);
    locales.get(primary).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales() -> LocaleSet {
        LocaleSet::new(["en", "lo", "th", "jp"], "en").unwrap()
    }

    #[test]
    fn test_accept_language_matching() {
        let locales = locales();
        let pick = |value: Option<&str>| locale_from_accept_language(value, &locales).to_string();

        assert_eq!(pick(Some("th")), "th");
        assert_eq!(pick(Some("th-TH")), "th");
        assert_eq!(pick(Some("lo_LA")), "lo");
        assert_eq!(pick(Some("ja-JP,en;q=0.8")), "jp");
        assert_eq!(pick(Some("fr-FR, lo;q=0.5")), "lo");
        assert_eq!(pick(Some("fr")), "en"); // Unsupported, fallback to default
        assert_eq!(pick(Some("")), "en");
        assert_eq!(pick(None), "en");
    }

    #[tokio::test]
    async fn test_scope_sets_current_locale() {
        let locales = locales();
        let th = locales.get("th").unwrap().clone();

        assert_eq!(current_locale(), FALLBACK_LOCALE);
        let inside = scope_locale(&th, async { current_locale() }).await;
        assert_eq!(inside, "th");
        assert_eq!(current_locale(), FALLBACK_LOCALE);
    }
}
