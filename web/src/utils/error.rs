use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_i18n::t;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use super::i18n::current_locale;

/// API error with a stable numeric code and a localized message.
#[derive(Error, Debug)]
pub enum ApiError {
    // Authentication errors 1xxx
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication service unavailable: {0}")]
    AuthBackendUnavailable(String),

    // Resource errors 3xxx
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    // Validation errors 4xxx
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // System errors 5xxx
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Dictionary unavailable: {0}")]
    DictionaryUnavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid_credentials() -> Self {
        Self::InvalidCredentials
    }

    pub fn auth_backend_unavailable(message: impl Into<String>) -> Self {
        Self::AuthBackendUnavailable(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::ResourceNotFound(message.into())
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    pub fn dictionary_unavailable(message: impl Into<String>) -> Self {
        Self::DictionaryUnavailable(message.into())
    }

    pub fn error_code(&self) -> i32 {
        match self {
            // Authentication errors 1xxx
            Self::InvalidCredentials => 1003,
            Self::AuthBackendUnavailable(_) => 1004,

            // Resource errors 3xxx
            Self::ResourceNotFound(_) => 3000,

            // Validation errors 4xxx
            Self::ValidationError(_) => 4001,
            Self::InvalidInput(_) => 4002,

            // System errors 5xxx
            Self::InternalError(_) => 5001,
            Self::Other(_) => 5001,
            Self::Database(_) => 5002,
            Self::DictionaryUnavailable(_) => 5003,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.error_code() {
            1004 => StatusCode::BAD_GATEWAY,
            1001..=1999 => StatusCode::UNAUTHORIZED,
            3000..=3999 => StatusCode::NOT_FOUND,
            4001..=4999 => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Message in the locale of the request being served.
    pub fn localized_message(&self) -> String {
        let locale = current_locale();
        match self {
            Self::InvalidCredentials => t!("auth.invalid_credentials", locale = &locale).to_string(),
            Self::AuthBackendUnavailable(_) => {
                t!("auth.backend_unavailable", locale = &locale).to_string()
            },
            Self::ResourceNotFound(name) => {
                t!("resource.not_found", locale = &locale, name = name).to_string()
            },
            Self::ValidationError(details) => {
                t!("validation.failed", locale = &locale, details = details).to_string()
            },
            Self::InvalidInput(msg) => msg.clone(),
            Self::InternalError(msg) => {
                t!("internal.error", locale = &locale, message = msg).to_string()
            },
            Self::Database(err) => {
                t!("database.error", locale = &locale, error = err.to_string()).to_string()
            },
            // No detail: nothing about the bundle location is useful to a visitor.
            Self::DictionaryUnavailable(_) => {
                t!("dictionary.unavailable", locale = &locale).to_string()
            },
            Self::Other(err) => {
                t!("internal.error", locale = &locale, message = err.to_string()).to_string()
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let response =
            ApiErrorResponse { code: self.error_code(), message: self.localized_message(), details: None };

        (status, Json(response)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal_error(format!("JSON serialization error: {}", err))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let codes: Vec<&str> = errs.iter().map(|err| err.code.as_ref()).collect();
                format!("{}: {}", field, codes.join(", "))
            })
            .collect();
        details.sort();
        ApiError::validation_error(details.join("; "))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
