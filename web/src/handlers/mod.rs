pub mod dictionary;
pub mod locale;
pub mod page;
pub mod session;
