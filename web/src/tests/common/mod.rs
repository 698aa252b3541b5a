// Common test utilities and helpers

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::AppState;
use crate::config::Config;
use crate::models::{Dictionary, Locale, LocaleSet, Session, User, UserId};
use crate::services::{
    AuthBackend, AuthClientError, BundleError, BundleSource, DictionaryService, DurableStorage,
    LocaleResolver, NewUser, RegisterOutcome, SessionService, SqliteStorage,
};

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub async fn create_test_storage() -> Arc<SqliteStorage> {
    Arc::new(SqliteStorage::new(create_test_db().await))
}

pub fn test_locales() -> LocaleSet {
    LocaleSet::new(["en", "lo", "th", "jp"], "en").expect("valid locale set")
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.logging.file = None;
    config
}

/// In-memory bundle source that records every load.
#[derive(Default)]
pub struct MemoryBundles {
    bundles: Mutex<HashMap<String, Vec<u8>>>,
    delays: Mutex<HashMap<String, Duration>>,
    loads: Mutex<Vec<String>>,
}

impl MemoryBundles {
    /// en/lo/th/jp bundles sharing the same keys.
    pub fn standard() -> Self {
        let bundles = Self::default();
        bundles.put("en", bundle_json("Finance Tracker", "Dashboard", "Log out"));
        bundles.put("lo", bundle_json("ຕິດຕາມການເງິນ", "ໜ້າຫຼັກ", "ອອກຈາກລະບົບ"));
        bundles.put("th", bundle_json("ติดตามการเงิน", "แดชบอร์ด", "ออกจากระบบ"));
        bundles.put("jp", bundle_json("家計トラッカー", "ダッシュボード", "ログアウト"));
        bundles
    }

    pub fn put(&self, locale: &str, value: Value) {
        self.put_raw(locale, value.to_string().as_bytes());
    }

    pub fn put_raw(&self, locale: &str, bytes: &[u8]) {
        self.bundles.lock().unwrap().insert(locale.to_string(), bytes.to_vec());
    }

    pub fn remove(&self, locale: &str) {
        self.bundles.lock().unwrap().remove(locale);
    }

    pub fn delay(&self, locale: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(locale.to_string(), delay);
    }

    pub fn load_count(&self, locale: &str) -> usize {
        self.loads.lock().unwrap().iter().filter(|code| *code == locale).count()
    }

    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl BundleSource for MemoryBundles {
    async fn load(&self, locale: &Locale) -> Result<Dictionary, BundleError> {
        self.loads.lock().unwrap().push(locale.to_string());

        let delay = self.delays.lock().unwrap().get(locale.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let bytes = self
            .bundles
            .lock()
            .unwrap()
            .get(locale.as_str())
            .cloned()
            .ok_or_else(|| BundleError::Missing(locale.to_string()))?;
        Dictionary::from_json(&bytes)
            .map_err(|source| BundleError::Malformed { locale: locale.to_string(), source })
    }

    fn describe(&self) -> String {
        "memory bundles".to_string()
    }
}

pub fn bundle_json(title: &str, dashboard: &str, logout: &str) -> Value {
    json!({
        "appTitle": title,
        "login": "login",
        "sidebar": {
            "title": title,
            "logout": logout,
            "menu": { "dashboard": dashboard }
        }
    })
}

pub fn test_user(id: i64, name: &str, email: &str) -> User {
    User {
        id: UserId::Number(id),
        username: name.to_string(),
        email: email.to_string(),
        main_currency: Some("LAK".to_string()),
        profile: Default::default(),
    }
}

/// Auth backend stand-in with a fixed set of accounts.
#[derive(Default)]
pub struct FakeAuthBackend {
    accounts: Mutex<HashMap<String, (String, Session)>>,
    registered: Mutex<Vec<NewUser>>,
    sign_in_on_register: AtomicBool,
    unreachable: AtomicBool,
    login_calls: AtomicUsize,
}

impl FakeAuthBackend {
    pub fn with_account(email: &str, password: &str, session: Session) -> Self {
        let backend = Self::default();
        backend.add_account(email, password, session);
        backend
    }

    pub fn add_account(&self, email: &str, password: &str, session: Session) {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), session));
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn set_sign_in_on_register(&self, enabled: bool) {
        self.sign_in_on_register.store(enabled, Ordering::SeqCst);
    }

    pub fn registered(&self) -> Vec<NewUser> {
        self.registered.lock().unwrap().clone()
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthBackend for FakeAuthBackend {
    async fn login(&self, email: &str, password: &str) -> Result<Session, AuthClientError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AuthClientError::InvalidResponse("connection refused".to_string()));
        }

        match self.accounts.lock().unwrap().get(email) {
            Some((expected, session)) if expected == password => Ok(session.clone()),
            _ => Err(AuthClientError::Rejected("Invalid email or password".to_string())),
        }
    }

    async fn register(&self, new_user: &NewUser) -> Result<RegisterOutcome, AuthClientError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AuthClientError::InvalidResponse("connection refused".to_string()));
        }
        if self.accounts.lock().unwrap().contains_key(&new_user.email) {
            return Err(AuthClientError::Rejected("Email already registered".to_string()));
        }

        self.registered.lock().unwrap().push(new_user.clone());
        let session = self.sign_in_on_register.load(Ordering::SeqCst).then(|| Session {
            user: test_user(99, &new_user.username, &new_user.email),
            token: format!("token-{}", new_user.username),
        });

        Ok(RegisterOutcome { status: "success".to_string(), message: None, session })
    }
}

pub fn alice_session() -> Session {
    Session { user: test_user(1, "alice", "alice@example.com"), token: "alice-token".to_string() }
}

pub fn alice_backend() -> Arc<FakeAuthBackend> {
    Arc::new(FakeAuthBackend::with_account("alice@example.com", "secret123", alice_session()))
}

pub fn dictionary_service(bundles: Arc<MemoryBundles>) -> Arc<DictionaryService> {
    Arc::new(DictionaryService::new(test_locales(), bundles, true))
}

pub fn locale_resolver(storage: Arc<dyn DurableStorage>, prefer_saved: bool) -> LocaleResolver {
    LocaleResolver::new(test_locales(), storage, prefer_saved)
}

pub fn session_service(
    storage: Arc<dyn DurableStorage>,
    backend: Arc<FakeAuthBackend>,
) -> SessionService {
    SessionService::new(storage, backend)
}

/// Fully wired state over in-memory storage, already rehydrated.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub storage: Arc<SqliteStorage>,
    pub bundles: Arc<MemoryBundles>,
    pub backend: Arc<FakeAuthBackend>,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(MemoryBundles::standard()).await
}

pub async fn create_test_app_with(bundles: MemoryBundles) -> TestApp {
    let storage = create_test_storage().await;
    let bundles = Arc::new(bundles);
    let backend = alice_backend();

    let state = AppState::assemble(test_config(), storage.clone(), bundles.clone(), backend.clone())
        .expect("Failed to assemble app state");
    state.sessions.init().await.expect("Failed to rehydrate session");

    TestApp { state: Arc::new(state), storage, bundles, backend }
}
