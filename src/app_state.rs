use std::sync::Arc;

use crate::{
    auth::guard::RouterGuard,
    config::ClientConfig,
    errors::ClientResult,
    routes::{default_routes, RouteTable},
    services::{api_client::ApiClient, auth_service::AuthService, navigation::Navigator},
    session::SessionContext,
    state::AuthState,
    store::SessionStore,
};

/// Everything the application shares, wired to one session.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionContext,
    pub api: ApiClient,
    pub auth_service: Arc<AuthService>,
    pub auth_state: Arc<AuthState>,
    pub guard: Arc<RouterGuard>,
    pub config: Arc<ClientConfig>,
}

impl AppState {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        Self::with_routes(config, store, navigator, default_routes())
    }

    pub fn with_routes(
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        routes: RouteTable,
    ) -> ClientResult<Self> {
        let session = SessionContext::new(store);
        let api = ApiClient::new(&config, session.clone(), navigator)?;
        let auth_service = Arc::new(AuthService::new(api.clone(), config.login_timeout));
        let auth_state = AuthState::new(Arc::clone(&auth_service));
        let guard = Arc::new(
            RouterGuard::new(session.clone(), routes).with_login_route(config.login_route.clone()),
        );

        Ok(Self {
            session,
            api,
            auth_service,
            auth_state,
            guard,
            config: Arc::new(config),
        })
    }
}
