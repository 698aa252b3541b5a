pub mod auth_client;
pub mod bundle_source;
pub mod dictionary_service;
pub mod locale_resolver;
pub mod page_service;
pub mod session_service;
pub mod storage;

pub use auth_client::{AuthBackend, AuthClientError, HttpAuthBackend, NewUser, RegisterOutcome};
pub use bundle_source::{BundleError, BundleSource, DirectoryBundles, EmbeddedBundles};
pub use dictionary_service::{ActiveDictionary, BundleIssue, DictionaryService};
pub use locale_resolver::{LocaleResolver, split_locale};
pub use page_service::PageService;
pub use session_service::{GateDecision, SessionService, login_path};
pub use storage::{DurableStorage, LOCALE_PREFERENCE_KEY, SESSION_KEY, SqliteStorage};
