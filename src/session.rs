//! Typed view over the session keys in a [`SessionStore`].
//!
//! A `SessionContext` is the one handle every component shares: the API
//! client reads the token from it, the auth service writes logins into it, the
//! router guard checks it on navigation. Listeners registered with
//! [`SessionContext::on_change`] hear about every write and clear, including
//! the clear triggered by an unauthorized response.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, PoisonError, RwLock,
};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{
    auth::token,
    models::domain::{Session, UserProfile, UserRole},
    store::{SessionStore, LOGIN_TIME_KEY, ROLE_KEY, SESSION_KEYS, TOKEN_KEY, USER_DATA_KEY},
};

type Listener = Arc<dyn Fn() + Send + Sync>;

pub type ListenerId = usize;

#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    listeners: Arc<RwLock<Vec<(ListenerId, Listener)>>>,
    next_listener: Arc<AtomicUsize>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_listener: Arc::new(AtomicUsize::new(1)),
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Stored role; an unrecognized value reads as no role.
    pub fn role(&self) -> Option<UserRole> {
        self.store.get(ROLE_KEY)?.parse().ok()
    }

    /// Stored profile; missing or corrupt JSON reads as no profile.
    pub fn user(&self) -> Option<UserProfile> {
        let raw = self.store.get(USER_DATA_KEY)?;
        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("Stored user data is not a JSON object: {}", e);
                None
            }
        }
    }

    pub fn login_time(&self) -> Option<DateTime<Utc>> {
        let millis: i64 = self.store.get(LOGIN_TIME_KEY)?.trim().parse().ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    /// A token is present and its expiry has not passed.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some_and(|t| token::is_token_valid(&t))
    }

    pub fn snapshot(&self) -> Session {
        Session {
            token: self.token(),
            role: self.role(),
            user: self.user(),
            login_time: self.login_time(),
        }
    }

    /// Writes every field of `session`; absent fields are removed so nothing
    /// from a previous login survives.
    pub fn persist(&self, session: &Session) {
        self.write_or_remove(TOKEN_KEY, session.token.clone());
        self.write_or_remove(ROLE_KEY, session.role.map(|r| r.as_str().to_string()));
        self.write_or_remove(USER_DATA_KEY, session.user.as_ref().and_then(encode_user));
        self.write_or_remove(
            LOGIN_TIME_KEY,
            session.login_time.map(|t| t.timestamp_millis().to_string()),
        );
        self.notify();
    }

    /// Shallow-merges `partial` into the stored profile and returns the result.
    pub fn merge_user(&self, partial: Map<String, Value>) -> UserProfile {
        let mut user = self.user().unwrap_or_default();
        user.merge(partial);
        self.write_or_remove(USER_DATA_KEY, encode_user(&user));
        self.notify();
        user
    }

    pub fn clear(&self) {
        for key in SESSION_KEYS {
            self.store.remove(key);
        }
        self.notify();
    }

    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    fn write_or_remove(&self, key: &str, value: Option<String>) {
        match value {
            Some(v) => self.store.set(key, &v),
            None => self.store.remove(key),
        }
    }
}

fn encode_user(user: &UserProfile) -> Option<String> {
    serde_json::to_string(user)
        .map_err(|e| log::error!("Failed to serialize user data: {}", e))
        .ok()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::store::{MemoryStore, MockSessionStore};
    use crate::test_utils::fixtures::{expired_token, profile, token_with_payload, valid_token};
    use mockall::predicate::eq;
    use serde_json::json;

    fn context() -> SessionContext {
        SessionContext::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_persist_and_read_back() {
        let session_ctx = context();
        let token = valid_token();
        let session = Session::new(token.clone(), UserRole::Admin, Some(profile(json!({"id": 1}))));

        session_ctx.persist(&session);

        assert_eq!(session_ctx.token(), Some(token));
        assert_eq!(session_ctx.role(), Some(UserRole::Admin));
        assert_eq!(session_ctx.user().and_then(|u| u.id()), Some(1));
        assert_eq!(
            session_ctx.login_time().map(|t| t.timestamp_millis()),
            session.login_time.map(|t| t.timestamp_millis())
        );
        assert!(session_ctx.is_authenticated());
    }

    #[test]
    fn test_persist_removes_absent_fields() {
        let session_ctx = context();
        session_ctx.persist(&Session::new(valid_token(), UserRole::User, Some(profile(json!({"id": 1})))));
        session_ctx.persist(&Session::new(valid_token(), UserRole::User, None));

        assert!(session_ctx.user().is_none());
        assert!(session_ctx.store().get(USER_DATA_KEY).is_none());
    }

    #[test]
    fn test_clear_removes_every_key() {
        let mut store = MockSessionStore::new();
        for key in SESSION_KEYS {
            store.expect_remove().with(eq(key)).times(1).return_const(());
        }

        SessionContext::new(Arc::new(store)).clear();
    }

    #[test]
    fn test_corrupt_user_data_reads_as_none() {
        let session_ctx = context();
        session_ctx.store().set(USER_DATA_KEY, "{broken");
        assert!(session_ctx.user().is_none());

        session_ctx.store().set(USER_DATA_KEY, "undefined");
        assert!(session_ctx.user().is_none());
    }

    #[test]
    fn test_unknown_role_reads_as_none() {
        let session_ctx = context();
        session_ctx.store().set(ROLE_KEY, "superuser");
        assert!(session_ctx.role().is_none());
    }

    #[test]
    fn test_expired_or_missing_token_is_not_authenticated() {
        let session_ctx = context();
        assert!(!session_ctx.is_authenticated());

        session_ctx.store().set(TOKEN_KEY, &expired_token());
        assert!(!session_ctx.is_authenticated());

        session_ctx.store().set(TOKEN_KEY, "");
        assert!(session_ctx.token().is_none());
    }

    #[test]
    fn test_fractional_expiry_token_is_authenticated() {
        let session_ctx = context();
        let exp = (Utc::now() + chrono::Duration::hours(1)).timestamp();
        let token = token_with_payload(format!(r#"{{"exp": {}.25}}"#, exp).as_bytes());
        session_ctx.persist(&Session::new(token, UserRole::User, None));

        assert!(session_ctx.is_authenticated());
    }

    #[test]
    fn test_merge_user_without_stored_profile() {
        let session_ctx = context();
        let merged = session_ctx.merge_user(json!({"full_name": "Ada"}).as_object().unwrap().clone());

        assert_eq!(merged.full_name(), Some("Ada"));
        assert_eq!(session_ctx.user(), Some(merged));
    }

    #[test]
    fn test_listeners_hear_every_change() {
        let session_ctx = context();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        session_ctx.on_change(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        session_ctx.persist(&Session::new(valid_token(), UserRole::User, None));
        session_ctx.merge_user(Map::new());
        session_ctx.clear();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_clones_share_store_and_listeners() {
        let session_ctx = context();
        let other = session_ctx.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        other.on_change(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        session_ctx.persist(&Session::new(valid_token(), UserRole::User, None));

        assert_eq!(other.role(), Some(UserRole::User));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_removed_listener_is_not_called() {
        let session_ctx = context();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let id = session_ctx.on_change(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(session_ctx.listener_count(), 1);

        assert!(session_ctx.remove_listener(id));
        assert!(!session_ctx.remove_listener(id));
        session_ctx.clear();

        assert_eq!(session_ctx.listener_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
