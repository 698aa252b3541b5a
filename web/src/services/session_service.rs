use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::models::{DEFAULT_MAIN_CURRENCY, Locale, PersistedSession, RegisterResponse, Session};
use crate::services::auth_client::{AuthBackend, AuthClientError, NewUser, RegisterOutcome};
use crate::services::storage::{DurableStorage, SESSION_KEY};
use crate::utils::{ApiError, ApiResult};

const DEFAULT_REGISTER_MESSAGE: &str = "Registration successful";

/// Result of the page-mount session check.
#[derive(Debug)]
pub enum GateDecision {
    Allow(Session),
    Redirect(String),
}

/// Process-wide authentication state.
///
/// The state is `None` (anonymous) or a full [`Session`]; only [`init`],
/// [`login`], [`register`] and [`logout`] write it.
///
/// [`init`]: SessionService::init
/// [`login`]: SessionService::login
/// [`register`]: SessionService::register
/// [`logout`]: SessionService::logout
pub struct SessionService {
    storage: Arc<dyn DurableStorage>,
    backend: Arc<dyn AuthBackend>,
    state: RwLock<Option<Session>>,
    hydrated: watch::Sender<bool>,
}

impl SessionService {
    pub fn new(storage: Arc<dyn DurableStorage>, backend: Arc<dyn AuthBackend>) -> Self {
        let (hydrated, _) = watch::channel(false);
        Self { storage, backend, state: RwLock::new(None), hydrated }
    }

    /// Rehydrate from durable storage and raise the "hydrated" signal.
    ///
    /// Storage errors and corrupt data leave the state anonymous; the signal is
    /// raised in every case so gated pages never wait forever.
    pub async fn init(&self) -> ApiResult<bool> {
        let restored = self.read_persisted().await;

        let outcome = {
            let mut state = self.state.write().await;
            match restored {
                Ok(Some(session)) if state.is_none() => {
                    tracing::info!("Restored session for user {}", session.user.username);
                    *state = Some(session);
                    Ok(true)
                },
                Ok(_) => Ok(state.is_some()),
                Err(err) => Err(err),
            }
        };

        self.hydrated.send_replace(true);
        outcome
    }

    /// Resolves once [`SessionService::init`] has finished.
    pub async fn wait_hydrated(&self) {
        let mut ready = self.hydrated.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = ready.wait_for(|hydrated| *hydrated).await;
    }

    pub async fn current(&self) -> Option<Session> {
        self.state.read().await.clone()
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let session = self.backend.login(email, password).await.map_err(|err| match err {
            AuthClientError::Rejected(reason) => {
                tracing::warn!("Login rejected for {}: {}", email, reason);
                ApiError::invalid_credentials()
            },
            other => {
                tracing::error!("Login failed for {}: {}", email, other);
                ApiError::auth_backend_unavailable(other.to_string())
            },
        })?;

        self.establish(session.clone()).await?;
        tracing::info!("User {} signed in (ID: {})", session.user.username, session.user.id);
        Ok(session)
    }

    /// Returns the backend's status and message; signs the user in when the
    /// backend hands back credentials.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        main_currency: Option<&str>,
        password: &str,
    ) -> ApiResult<RegisterResponse> {
        let new_user = NewUser {
            username: username.to_string(),
            email: email.to_string(),
            main_currency: main_currency
                .filter(|currency| !currency.trim().is_empty())
                .unwrap_or(DEFAULT_MAIN_CURRENCY)
                .to_string(),
            password: password.to_string(),
        };

        let RegisterOutcome { status, message, session } =
            self.backend.register(&new_user).await.map_err(|err| match err {
                AuthClientError::Rejected(reason) => {
                    tracing::warn!("Registration rejected for {}: {}", username, reason);
                    ApiError::validation_error(reason)
                },
                other => {
                    tracing::error!("Registration failed for {}: {}", username, other);
                    ApiError::auth_backend_unavailable(other.to_string())
                },
            })?;

        if let Some(session) = session {
            self.establish(session).await?;
            tracing::info!("Registered and signed in user {}", username);
        } else {
            tracing::info!("Registered user {}", username);
        }

        Ok(RegisterResponse {
            status,
            message: message.unwrap_or_else(|| DEFAULT_REGISTER_MESSAGE.to_string()),
        })
    }

    /// Clear the session. Calling it while anonymous is a no-op.
    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        let previous = state.take();

        if let Err(err) = self.storage.remove(SESSION_KEY).await {
            tracing::warn!("Failed to clear persisted session: {}", err);
        }

        match previous {
            Some(session) => tracing::info!("User {} signed out", session.user.username),
            None => tracing::debug!("Logout without an active session"),
        }
    }

    /// Page-mount check: wait for hydration, then allow or send to the login page.
    pub async fn check_gate(&self, locale: &Locale) -> GateDecision {
        self.wait_hydrated().await;
        match self.current().await {
            Some(session) => GateDecision::Allow(session),
            None => GateDecision::Redirect(login_path(locale)),
        }
    }

    /// Persist first so a storage failure leaves the in-memory state untouched.
    async fn establish(&self, session: Session) -> ApiResult<()> {
        let mut state = self.state.write().await;
        let payload = serde_json::to_string(&PersistedSession::from_session(&session))?;
        self.storage.set(SESSION_KEY, &payload).await?;
        *state = Some(session);
        Ok(())
    }

    async fn read_persisted(&self) -> ApiResult<Option<Session>> {
        let Some(raw) = self.storage.get(SESSION_KEY).await? else {
            return Ok(None);
        };

        let parsed = serde_json::from_str::<PersistedSession>(&raw)
            .map_err(|err| err.to_string())
            .and_then(|persisted| persisted.into_session().map_err(str::to_string));

        match parsed {
            Ok(session) => Ok(session),
            Err(reason) => {
                tracing::warn!("Discarding corrupt persisted session: {}", reason);
                if let Err(err) = self.storage.remove(SESSION_KEY).await {
                    tracing::warn!("Failed to remove corrupt session: {}", err);
                }
                Ok(None)
            },
        }
    }
}

pub fn login_path(locale: &Locale) -> String {
    format!("/{}/login", locale)
}
