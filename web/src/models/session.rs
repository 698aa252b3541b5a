use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid email pattern"));

pub const DEFAULT_MAIN_CURRENCY: &str = "LAK";

/// Backend user ids arrive either as numbers or strings depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{}", id),
            Self::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(value_type = String)]
    pub id: UserId,
    #[serde(default, alias = "name")]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_currency: Option<String>,
    /// Any further profile attributes the backend sends along.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub profile: Map<String, Value>,
}

/// An authenticated identity and its bearer token, always held together.
#[derive(Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Shape written to durable storage under the session key.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PersistedSession {
    pub user: Option<User>,
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PersistedSession {
    pub fn from_session(session: &Session) -> Self {
        Self {
            user: Some(session.user.clone()),
            token: Some(session.token.clone()),
            saved_at: Some(Utc::now()),
        }
    }

    /// `Ok(None)` for a stored anonymous state, `Err` when only half a session survived.
    pub fn into_session(self) -> Result<Option<Session>, &'static str> {
        match (self.user, self.token) {
            (Some(user), Some(token)) if !token.is_empty() => Ok(Some(Session { user, token })),
            (None, None) => Ok(None),
            _ => Err("user and token must be persisted together"),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(regex(path = *EMAIL_SHAPE, code = "email_invalid"))]
    pub email: String,
    #[validate(length(min = 6, code = "password_min_length"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, code = "required"))]
    pub username: String,
    #[validate(length(min = 1, code = "required"))]
    pub email: String,
    #[serde(default)]
    pub main_currency: Option<String>,
    #[validate(length(min = 6, code = "password_min_length"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStateResponse {
    pub authenticated: bool,
    pub user: Option<User>,
}

impl From<Option<Session>> for SessionStateResponse {
    fn from(session: Option<Session>) -> Self {
        Self { authenticated: session.is_some(), user: session.map(|session| session.user) }
    }
}
