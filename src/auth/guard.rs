use crate::{
    models::domain::UserRole,
    routes::{RouteMeta, RouteTable},
    session::SessionContext,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Redirect(String),
}

/// Decides a navigation from the route's metadata and the session state.
/// Checks run in order: authentication, role, guest-only.
pub fn evaluate(meta: &RouteMeta, authenticated: bool, role: Option<UserRole>) -> NavigationDecision {
    decide(meta, authenticated, role, DEFAULT_LOGIN_ROUTE)
}

const DEFAULT_LOGIN_ROUTE: &str = "/login";

fn decide(
    meta: &RouteMeta,
    authenticated: bool,
    role: Option<UserRole>,
    login_route: &str,
) -> NavigationDecision {
    if meta.requires_auth {
        if !authenticated {
            return NavigationDecision::Redirect(login_route.to_string());
        }
        if let Some(required) = meta.role {
            if role != Some(required) {
                return NavigationDecision::Redirect("/".to_string());
            }
        }
    }

    if meta.guest && authenticated {
        let dashboard = role.unwrap_or(UserRole::User).dashboard_path();
        return NavigationDecision::Redirect(dashboard.to_string());
    }

    NavigationDecision::Allow
}

/// Runs before every navigation. Reads the persisted session directly, so
/// it never sees state older than what is on disk.
pub struct RouterGuard {
    session: SessionContext,
    routes: RouteTable,
    login_route: String,
}

impl RouterGuard {
    pub fn new(session: SessionContext, routes: RouteTable) -> Self {
        Self {
            session,
            routes,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
        }
    }

    pub fn with_login_route(mut self, login_route: impl Into<String>) -> Self {
        self.login_route = login_route.into();
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Unknown paths carry no metadata and are allowed.
    pub fn check(&self, target: &str) -> NavigationDecision {
        let meta = self
            .routes
            .resolve(target)
            .map(|r| r.meta)
            .unwrap_or_default();

        let decision = decide(
            &meta,
            self.session.is_authenticated(),
            self.session.role(),
            &self.login_route,
        );
        if let NavigationDecision::Redirect(to) = &decision {
            log::debug!("Navigation to {} redirected to {}", target, to);
        }
        decision
    }
}
