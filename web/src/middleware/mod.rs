pub mod auth;
pub mod locale;

pub use auth::page_gate_middleware;
pub use locale::{is_bypassed, locale_middleware};
