//! Observable authentication state for the view layer.
//!
//! The snapshot is never edited directly: `user`, `is_authenticated` and
//! `role` are re-derived from the [`SessionContext`](crate::session::SessionContext)
//! whenever it changes, so the view and the router guard read the same
//! source. Only `loading` and `error` are owned here.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, PoisonError, RwLock, Weak,
};

use crate::{
    errors::ClientResult,
    models::{
        domain::{UserProfile, UserRole},
        dto::{LoginRequest, LoginResponse, RegisterRequest},
    },
    services::auth_service::AuthService,
    session::ListenerId,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthSnapshot {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub role: Option<UserRole>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthSnapshot {
    pub fn is_admin(&self) -> bool {
        self.is_authenticated && self.role == Some(UserRole::Admin)
    }

    pub fn is_user(&self) -> bool {
        self.is_authenticated && self.role == Some(UserRole::User)
    }
}

pub type SubscriptionId = usize;

type Observer = Arc<dyn Fn(&AuthSnapshot) + Send + Sync>;

pub struct AuthState {
    auth: Arc<AuthService>,
    snapshot: RwLock<AuthSnapshot>,
    observers: RwLock<Vec<(SubscriptionId, Observer)>>,
    next_id: AtomicUsize,
    session_listener: ListenerId,
}

impl AuthState {
    pub fn new(auth: Arc<AuthService>) -> Arc<Self> {
        let state = Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let session_listener = auth.session().on_change(move || {
                if let Some(state) = weak.upgrade() {
                    state.sync_from_session();
                }
            });

            Self {
                auth,
                snapshot: RwLock::new(AuthSnapshot::default()),
                observers: RwLock::new(Vec::new()),
                next_id: AtomicUsize::new(1),
                session_listener,
            }
        });
        state.sync_from_session();

        state
    }

    pub fn auth(&self) -> &Arc<AuthService> {
        &self.auth
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&AuthSnapshot) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Loads whatever session is already persisted.
    pub fn init_auth(&self) {
        let _loading = self.begin_loading();
        self.sync_from_session();
    }

    pub async fn login(&self, credentials: &LoginRequest) -> ClientResult<LoginResponse> {
        let _loading = self.begin_loading();
        let result = self.auth.login(credentials).await;
        self.record_outcome(&result);
        result
    }

    pub async fn register(&self, user_data: &RegisterRequest) -> ClientResult<serde_json::Value> {
        let _loading = self.begin_loading();
        let result = self.auth.register(user_data).await;
        self.record_outcome(&result);
        result
    }

    pub fn logout(&self) {
        self.auth.logout();
        self.update(|s| s.error = None);
    }

    fn sync_from_session(&self) {
        let session = self.auth.session();
        let user = session.user();
        let is_authenticated = session.is_authenticated();
        let role = session.role();

        self.update(|s| {
            s.user = user;
            s.is_authenticated = is_authenticated;
            s.role = role;
        });
    }

    fn record_outcome<T>(&self, result: &ClientResult<T>) {
        if let Err(e) = result {
            let message = e.user_message();
            self.update(|s| s.error = Some(message));
        }
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });
        LoadingGuard { state: self }
    }

    fn update(&self, change: impl FnOnce(&mut AuthSnapshot)) {
        let snapshot = {
            let mut current = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            change(&mut current);
            current.clone()
        };

        let observers: Vec<Observer> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for observer in observers {
            observer(&snapshot);
        }
    }
}

impl Drop for AuthState {
    fn drop(&mut self) {
        self.auth.session().remove_listener(self.session_listener);
    }
}

/// Clears `loading` when dropped, however the call it covers ended.
struct LoadingGuard<'a> {
    state: &'a AuthState,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.update(|s| s.loading = false);
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use super::*;
    use crate::{
        config::ClientConfig,
        errors::ClientError,
        models::domain::Session,
        services::{api_client::ApiClient, navigation::MockNavigator},
        session::SessionContext,
        store::MemoryStore,
        test_utils::fixtures::valid_token,
    };
    use mockall::predicate::eq;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state_for(server_uri: &str, navigator: MockNavigator) -> Arc<AuthState> {
        let config = ClientConfig::test_config().with_base_url(format!("{}/api", server_uri));
        let session = SessionContext::new(Arc::new(MemoryStore::new()));
        let api = ApiClient::new(&config, session, Arc::new(navigator)).unwrap();
        AuthState::new(Arc::new(AuthService::new(api, config.login_timeout)))
    }

    fn record(state: &AuthState) -> Arc<Mutex<Vec<AuthSnapshot>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        state.subscribe(move |s| sink.lock().unwrap().push(s.clone()));
        seen
    }

    #[test]
    fn test_starts_from_persisted_session() {
        let config = ClientConfig::test_config();
        let session = SessionContext::new(Arc::new(MemoryStore::new()));
        session.persist(&Session::new(valid_token(), UserRole::Admin, None));
        let api = ApiClient::new(&config, session, Arc::new(MockNavigator::new())).unwrap();

        let state = AuthState::new(Arc::new(AuthService::new(api, config.login_timeout)));
        let snapshot = state.snapshot();

        assert!(snapshot.is_authenticated);
        assert!(snapshot.is_admin());
        assert!(!snapshot.is_user());
        assert!(!snapshot.loading);
    }

    #[test]
    fn test_init_auth_toggles_loading() {
        let state = state_for("http://127.0.0.1:5000", MockNavigator::new());
        let seen = record(&state);

        state.init_auth();

        let seen = seen.lock().unwrap();
        assert!(seen.first().unwrap().loading);
        assert!(!seen.last().unwrap().loading);
        assert!(!state.snapshot().is_authenticated);
    }

    #[tokio::test]
    async fn test_login_success_updates_snapshot() {
        let server = MockServer::start().await;
        let state = state_for(&server.uri(), MockNavigator::new());
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": valid_token(),
                "role": "user",
                "user": {"id": 4, "full_name": "Ada"}
            })))
            .mount(&server)
            .await;
        let seen = record(&state);

        state.login(&LoginRequest::user("ada@example.com", "pw")).await.unwrap();

        let snapshot = state.snapshot();
        assert!(snapshot.is_authenticated);
        assert!(snapshot.is_user());
        assert_eq!(snapshot.user.and_then(|u| u.id()), Some(4));
        assert!(!snapshot.loading);
        assert!(snapshot.error.is_none());
        assert!(seen.lock().unwrap().iter().any(|s| s.loading));
    }

    #[tokio::test]
    async fn test_login_failure_sets_error_and_clears_loading() {
        let server = MockServer::start().await;
        let state = state_for(&server.uri(), MockNavigator::new());
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "Invalid user credentials"})))
            .mount(&server)
            .await;

        let result = state.login(&LoginRequest::user("ada@example.com", "bad")).await;

        assert!(result.is_err());
        let snapshot = state.snapshot();
        assert_eq!(snapshot.error.as_deref(), Some("Invalid user credentials"));
        assert!(!snapshot.loading);
        assert!(!snapshot.is_authenticated);
    }

    #[tokio::test]
    async fn test_cancelled_login_clears_loading() {
        let server = MockServer::start().await;
        let state = state_for(&server.uri(), MockNavigator::new());
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;
        let seen = record(&state);

        let credentials = LoginRequest::user("ada@example.com", "pw");
        let timed_out = tokio::time::timeout(Duration::from_millis(100), state.login(&credentials)).await;

        assert!(timed_out.is_err());
        assert!(seen.lock().unwrap().iter().any(|s| s.loading));
        assert!(!state.snapshot().loading);
    }

    #[tokio::test]
    async fn test_backend_down_error_is_retry_message() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);
        let state = state_for(&uri, MockNavigator::new());

        let err = state
            .login(&LoginRequest::user("ada@example.com", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::NetworkUnavailable(_)));
        assert_eq!(state.snapshot().error, Some(err.user_message()));
    }

    #[tokio::test]
    async fn test_session_expiry_from_any_request_reaches_snapshot() {
        let server = MockServer::start().await;
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(eq("/login?reason=session_expired"))
            .times(1)
            .return_const(());
        let state = state_for(&server.uri(), navigator);
        state
            .auth()
            .session()
            .persist(&Session::new(valid_token(), UserRole::User, None));
        assert!(state.snapshot().is_authenticated);

        Mock::given(method("GET"))
            .and(path("/api/scores"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result: ClientResult<Value> = state.auth().api().get("/scores").await;

        assert!(matches!(result, Err(ClientError::Unauthorized(_))));
        assert!(!state.snapshot().is_authenticated);
        assert!(state.snapshot().role.is_none());
    }

    #[test]
    fn test_logout_updates_snapshot() {
        let state = state_for("http://127.0.0.1:5000", MockNavigator::new());
        state
            .auth()
            .session()
            .persist(&Session::new(valid_token(), UserRole::Admin, None));
        assert!(state.snapshot().is_admin());

        state.logout();

        let snapshot = state.snapshot();
        assert!(!snapshot.is_authenticated);
        assert!(snapshot.user.is_none());
        assert!(!snapshot.is_admin());
    }

    #[test]
    fn test_dropped_state_leaves_no_session_listener() {
        let config = ClientConfig::test_config();
        let session = SessionContext::new(Arc::new(MemoryStore::new()));
        let api = ApiClient::new(&config, session.clone(), Arc::new(MockNavigator::new())).unwrap();
        let auth = Arc::new(AuthService::new(api, config.login_timeout));

        for _ in 0..3 {
            let state = AuthState::new(Arc::clone(&auth));
            assert_eq!(session.listener_count(), 1);
            drop(state);
        }

        assert_eq!(session.listener_count(), 0);
        session.persist(&Session::new(valid_token(), UserRole::User, None));
    }

    #[test]
    fn test_poisoned_snapshot_lock_is_recovered() {
        let state = state_for("http://127.0.0.1:5000", MockNavigator::new());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = state.snapshot.write().unwrap();
            panic!("observer panicked while holding the snapshot");
        }));
        assert!(result.is_err());
        assert!(state.snapshot.is_poisoned());

        state
            .auth()
            .session()
            .persist(&Session::new(valid_token(), UserRole::Admin, None));
        assert!(state.snapshot().is_admin());

        state.logout();
        assert!(!state.snapshot().is_authenticated);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let state = state_for("http://127.0.0.1:5000", MockNavigator::new());
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let id = state.subscribe(move |_| *sink.lock().unwrap() += 1);

        state.init_auth();
        let after_first = *seen.lock().unwrap();
        assert!(after_first > 0);

        assert!(state.unsubscribe(id));
        assert!(!state.unsubscribe(id));
        state.init_auth();
        assert_eq!(*seen.lock().unwrap(), after_first);
    }
}
