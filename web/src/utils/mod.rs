pub mod error;
pub mod i18n;

pub use error::{ApiError, ApiResult};
pub use i18n::{current_locale, locale_from_accept_language, scope_locale};
