use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{
    Dictionary, HOME_PAGE, Locale, NAV_PAGES, NavItem, PageOutcome, PageView, RouteClass,
};
use crate::services::locale_resolver::{LocaleResolver, split_locale};
use crate::services::session_service::{GateDecision, SessionService};
use crate::services::dictionary_service::DictionaryService;
use crate::utils::ApiResult;

/// Page-mount pipeline shared by every page route.
///
/// Order per mount: resolve the locale from the path, load its dictionary,
/// check the session, then redirect or produce the page view. Protected
/// content is never built before the session check has completed.
pub struct PageService {
    resolver: Arc<LocaleResolver>,
    dictionaries: Arc<DictionaryService>,
    sessions: Arc<SessionService>,
    public_pages: HashSet<String>,
}

impl PageService {
    pub fn new(
        resolver: Arc<LocaleResolver>,
        dictionaries: Arc<DictionaryService>,
        sessions: Arc<SessionService>,
        public_pages: impl IntoIterator<Item = String>,
    ) -> Self {
        Self { resolver, dictionaries, sessions, public_pages: public_pages.into_iter().collect() }
    }

    /// Page name from the first segment after the locale; the bare locale is the home page.
    pub fn page_name(&self, path: &str) -> String {
        let (_, sub_path) = split_locale(self.resolver.locales(), path);
        sub_path
            .trim_start_matches('/')
            .split(['/', '?', '#'])
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(HOME_PAGE)
            .to_string()
    }

    pub fn classify(&self, page: &str) -> RouteClass {
        if page == HOME_PAGE || self.public_pages.contains(page) {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }

    pub async fn mount(&self, path: &str) -> ApiResult<PageOutcome> {
        let locale = self.resolver.resolve_current_locale(path);
        let dictionary = self.dictionaries.load_dictionary(Some(locale.as_str())).await?;

        let page = self.page_name(path);
        let access = self.classify(&page);

        let user = match (access, self.sessions.check_gate(&locale).await) {
            (_, GateDecision::Allow(session)) => Some(session.user),
            (RouteClass::Public, GateDecision::Redirect(_)) => None,
            (RouteClass::Protected, GateDecision::Redirect(target)) => {
                tracing::info!("No session for protected page {}, redirecting to {}", path, target);
                return Ok(PageOutcome::Redirect(target));
            },
        };

        let navigation = match user {
            Some(_) => {
                let fallback = self.dictionaries.load_default().await?;
                navigation(&locale, path, &dictionary, &fallback)
            },
            None => Vec::new(),
        };

        tracing::debug!("Mounted page '{}' ({:?}) in '{}'", page, access, locale);
        Ok(PageOutcome::Render(Box::new(PageView {
            locale,
            page,
            path: path.to_string(),
            access,
            dictionary: Dictionary::clone(&dictionary),
            user,
            navigation,
        })))
    }
}

/// Sidebar entries labelled from `sidebar.menu`; labels missing from a partial
/// bundle come from the default dictionary, then the page key.
fn navigation(
    locale: &Locale,
    path: &str,
    dictionary: &Dictionary,
    fallback: &Dictionary,
) -> Vec<NavItem> {
    NAV_PAGES
        .iter()
        .map(|key| {
            let href = format!("/{}/{}", locale, key);
            let label_key = format!("sidebar.menu.{}", key);
            NavItem {
                key: key.to_string(),
                label: dictionary
                    .get(&label_key)
                    .or_else(|| fallback.get(&label_key))
                    .unwrap_or(*key)
                    .to_string(),
                active: path.trim_end_matches('/') == href,
                href,
            }
        })
        .collect()
}
