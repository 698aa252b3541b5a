use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use thiserror::Error;

static LOCALE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2,3}(-[a-z0-9]{2,8})*$").expect("valid locale pattern"));

/// A language tag that belongs to the configured [`LocaleSet`].
///
/// Values are only handed out by a `LocaleSet`, so holding a `Locale` means the
/// code is supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale(Arc<str>);

impl Locale {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Locale {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocaleSetError {
    #[error("at least one locale must be configured")]
    Empty,

    #[error("'{0}' is not a valid locale code")]
    InvalidCode(String),

    #[error("locale '{0}' is configured more than once")]
    Duplicate(String),

    #[error("default locale '{0}' is not in the supported set")]
    DefaultNotSupported(String),
}

/// The closed set of supported locales with its single default.
#[derive(Debug, Clone)]
pub struct LocaleSet {
    locales: Vec<Locale>,
    default: Locale,
}

impl LocaleSet {
    pub fn new<I, S>(codes: I, default: &str) -> Result<Self, LocaleSetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut locales: Vec<Locale> = Vec::new();
        for code in codes {
            let code = code.as_ref().trim();
            if !LOCALE_CODE.is_match(code) {
                return Err(LocaleSetError::InvalidCode(code.to_string()));
            }
            if locales.iter().any(|existing| existing.as_str() == code) {
                return Err(LocaleSetError::Duplicate(code.to_string()));
            }
            locales.push(Locale(Arc::from(code)));
        }

        if locales.is_empty() {
            return Err(LocaleSetError::Empty);
        }

        let default = locales
            .iter()
            .find(|locale| locale.as_str() == default.trim())
            .cloned()
            .ok_or_else(|| LocaleSetError::DefaultNotSupported(default.to_string()))?;

        Ok(Self { locales, default })
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default
    }

    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    /// Exact, case-sensitive membership lookup.
    pub fn get(&self, code: &str) -> Option<&Locale> {
        self.locales.iter().find(|locale| locale.as_str() == code)
    }

    /// Never fails: empty or unknown input resolves to the default.
    pub fn resolve(&self, code: Option<&str>) -> Locale {
        code.and_then(|code| self.get(code.trim()))
            .unwrap_or(&self.default)
            .clone()
    }
}
