pub mod dictionary;
pub mod locale;
pub mod page;
pub mod session;

pub use dictionary::{Dictionary, DictionaryError, SchemaViolation};
pub use locale::{Locale, LocaleSet, LocaleSetError};
pub use page::{
    DEFAULT_PUBLIC_PAGES, HOME_PAGE, NAV_PAGES, NavItem, PageOutcome, PageView, RouteClass,
};
pub use session::{
    DEFAULT_MAIN_CURRENCY, LoginRequest, LoginResponse, PersistedSession, RegisterRequest,
    RegisterResponse, Session, SessionStateResponse, User, UserId,
};
