use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Session, User};
use crate::utils::{ApiError, ApiResult};

const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Error)]
pub enum AuthClientError {
    /// The backend answered and refused the request.
    #[error("{0}")]
    Rejected(String),

    #[error("auth backend unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response from auth backend: {0}")]
    InvalidResponse(String),
}

/// `{status, message?, data?}` wrapper used by every backend endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: User,
    pub access_token: String,
}

impl AuthPayload {
    fn into_session(self) -> Result<Session, AuthClientError> {
        if self.access_token.is_empty() {
            return Err(AuthClientError::InvalidResponse("empty access token".to_string()));
        }
        Ok(Session { user: self.user, token: self.access_token })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub main_currency: String,
    pub password: String,
}

#[derive(Debug)]
pub struct RegisterOutcome {
    pub status: String,
    pub message: Option<String>,
    /// Present when the backend signs the new user in right away.
    pub session: Option<Session>,
}

/// The finance API's authentication endpoints.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<Session, AuthClientError>;

    async fn register(&self, new_user: &NewUser) -> Result<RegisterOutcome, AuthClientError>;
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

pub struct HttpAuthBackend {
    client: Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            ApiError::internal_error(format!("Failed to build HTTP client: {}", err))
        })?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiEnvelope<T>, AuthClientError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_server_error() {
            return Err(AuthClientError::InvalidResponse(format!("HTTP {}", status)));
        }

        match serde_json::from_slice::<ApiEnvelope<T>>(&bytes) {
            Ok(envelope) if status.is_client_error() => Err(AuthClientError::Rejected(
                envelope.message.unwrap_or_else(|| format!("HTTP {}", status)),
            )),
            Ok(envelope) => Ok(envelope),
            Err(_) if status.is_client_error() => {
                Err(AuthClientError::Rejected(format!("HTTP {}", status)))
            },
            Err(err) => Err(AuthClientError::InvalidResponse(err.to_string())),
        }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, email: &str, password: &str) -> Result<Session, AuthClientError> {
        let envelope: ApiEnvelope<AuthPayload> =
            self.post("/users/login", &Credentials { email, password }).await?;

        if envelope.status != STATUS_SUCCESS {
            return Err(AuthClientError::Rejected(
                envelope.message.unwrap_or_else(|| "Login failed".to_string()),
            ));
        }

        envelope
            .data
            .ok_or_else(|| AuthClientError::InvalidResponse("missing login data".to_string()))?
            .into_session()
    }

    async fn register(&self, new_user: &NewUser) -> Result<RegisterOutcome, AuthClientError> {
        let envelope: ApiEnvelope<AuthPayload> = self.post("/users/register", new_user).await?;

        if envelope.status != STATUS_SUCCESS {
            return Err(AuthClientError::Rejected(
                envelope.message.unwrap_or_else(|| "Registration failed".to_string()),
            ));
        }

        let session = envelope.data.map(AuthPayload::into_session).transpose()?;
        Ok(RegisterOutcome { status: envelope.status, message: envelope.message, session })
    }
}
