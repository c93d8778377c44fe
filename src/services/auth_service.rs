use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Map, Value};
use validator::Validate;

use crate::{
    auth::{claims::TokenIdentity, token},
    errors::{ClientError, ClientResult},
    models::{
        domain::{Session, UserProfile, UserRole},
        dto::{LoginRequest, LoginResponse, RegisterRequest, ValidateResponse},
    },
    services::api_client::ApiClient,
    session::SessionContext,
};

pub struct AuthService {
    api: ApiClient,
    session: SessionContext,
    login_timeout: Duration,
}

impl AuthService {
    pub fn new(api: ApiClient, login_timeout: Duration) -> Self {
        let session = api.session().clone();
        Self {
            api,
            session,
            login_timeout,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Signs in and stores the new session. Nothing is stored unless the
    /// backend returned a token.
    pub async fn login(&self, credentials: &LoginRequest) -> ClientResult<LoginResponse> {
        credentials.validate()?;
        let login_name = credentials.login_name().unwrap_or_default();

        let request = self
            .api
            .bare_request(Method::POST, "/auth/login")
            .json(credentials)
            .timeout(self.login_timeout);

        let mut response: LoginResponse = self.api.execute_unguarded(request).await.map_err(|e| {
            log::error!("Login failed for {}: {}", login_name, e);
            e
        })?;

        let access_token = match response.access_token.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                log::error!("Login response for {} did not include an access token", login_name);
                return Err(ClientError::MissingToken);
            }
        };

        let identity = token::decode_claims(&access_token)
            .ok()
            .and_then(|claims| claims.identity());
        let role = response
            .role
            .or_else(|| identity.as_ref().and_then(|i| i.role))
            .unwrap_or(UserRole::User);
        let user = response
            .user
            .take()
            .or_else(|| identity.as_ref().map(|i| profile_from_identity(i, role)));

        self.session
            .persist(&Session::new(access_token.clone(), role, user.clone()));
        log::info!("Logged in as {} ({})", login_name, role);

        response.access_token = Some(access_token);
        response.role = Some(role);
        response.user = user;
        Ok(response)
    }

    pub fn logout(&self) {
        self.session.clear();
        log::info!("Logged out");
    }

    pub async fn register(&self, user_data: &RegisterRequest) -> ClientResult<Value> {
        user_data.validate()?;

        let request = self
            .api
            .bare_request(Method::POST, "/auth/register")
            .json(user_data);

        self.api.execute_unguarded(request).await.map_err(|e| {
            log::error!("Registration failed for {}: {}", user_data.email, e);
            e
        })
    }

    /// Local check only: a token is stored and has not expired.
    pub fn is_authenticated(&self) -> bool {
        self.is_token_valid()
    }

    pub fn is_token_valid(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_token_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.session
            .token()
            .is_some_and(|t| token::is_token_valid_at(&t, now))
    }

    /// Asks the backend whether the stored token is still accepted. Any
    /// failure, including an unreachable backend, reads as `false`.
    pub async fn validate_token_with_server(&self) -> bool {
        let Some(access_token) = self.session.token() else {
            return false;
        };

        let request = self
            .api
            .bare_request(Method::GET, "/auth/validate")
            .bearer_auth(access_token);

        match self.api.execute_unguarded::<ValidateResponse>(request).await {
            Ok(response) => response.valid,
            Err(e) => {
                log::warn!("Server-side token validation failed: {}", e);
                false
            }
        }
    }

    pub fn get_current_user(&self) -> Option<UserProfile> {
        self.session.user()
    }

    pub fn get_token(&self) -> Option<String> {
        self.session.token()
    }

    pub fn get_role(&self) -> Option<UserRole> {
        self.session.role()
    }

    /// Id from the stored profile, falling back to the token's identity.
    pub fn get_user_id(&self) -> Option<i64> {
        self.get_current_user().and_then(|u| u.id()).or_else(|| {
            let claims = token::decode_claims(&self.session.token()?).ok()?;
            claims.identity()?.id
        })
    }

    pub fn login_time(&self) -> Option<DateTime<Utc>> {
        self.session.login_time()
    }

    pub fn session_age(&self) -> Option<chrono::Duration> {
        self.login_time().map(|t| Utc::now() - t)
    }

    pub fn update_user_data(&self, partial: Map<String, Value>) -> UserProfile {
        self.session.merge_user(partial)
    }
}

fn profile_from_identity(identity: &TokenIdentity, role: UserRole) -> UserProfile {
    let mut profile = UserProfile::new();
    if let Some(id) = identity.id {
        profile.set("id", json!(id));
    }
    profile.set("role", json!(role.as_str()));
    profile
}
