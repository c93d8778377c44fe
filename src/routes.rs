//! Static route map of the quiz application.

use crate::models::domain::UserRole;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub role: Option<UserRole>,
    pub guest: bool,
}

impl RouteMeta {
    pub const PUBLIC: RouteMeta = RouteMeta {
        requires_auth: false,
        role: None,
        guest: false,
    };

    pub const GUEST: RouteMeta = RouteMeta {
        requires_auth: false,
        role: None,
        guest: true,
    };

    pub const fn signed_in(role: UserRole) -> Self {
        RouteMeta {
            requires_auth: true,
            role: Some(role),
            guest: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    /// `/segment/:param` pattern; `*` as the whole pattern matches any path.
    pub pattern: String,
    pub meta: RouteMeta,
}

impl Route {
    pub fn new(name: &str, pattern: &str, meta: RouteMeta) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            meta,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.pattern == "*" {
            return true;
        }
        let mut wanted = segments(&self.pattern);
        let mut actual = segments(path);
        loop {
            match (wanted.next(), actual.next()) {
                (None, None) => return true,
                (Some(w), Some(_)) if w.starts_with(':') => continue,
                (Some(w), Some(a)) if w == a => continue,
                _ => return false,
            }
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Strips query string and fragment from a navigation target.
pub fn path_only(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// First route, in declaration order, whose pattern matches `target`.
    pub fn resolve(&self, target: &str) -> Option<&Route> {
        let path = path_only(target);
        self.routes.iter().find(|r| r.matches(path))
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

pub fn default_routes() -> RouteTable {
    let admin = RouteMeta::signed_in(UserRole::Admin);
    let user = RouteMeta::signed_in(UserRole::User);

    RouteTable::new(vec![
        Route::new("home", "/", RouteMeta::PUBLIC),
        Route::new("login", "/login", RouteMeta::GUEST),
        Route::new("register", "/register", RouteMeta::GUEST),
        // Admin
        Route::new("adminDashboard", "/admin", admin),
        Route::new("adminSubjects", "/admin/subjects", admin),
        Route::new("adminUsers", "/admin/users", admin),
        Route::new("adminChapters", "/admin/subjects/:id/chapters", admin),
        Route::new("adminQuizzes", "/admin/chapters/:id/quizzes", admin),
        Route::new("adminQuestions", "/admin/quizzes/:id/questions", admin),
        Route::new("adminEmailTasks", "/admin/email-tasks", admin),
        // Learner
        Route::new("userDashboard", "/dashboard", user),
        Route::new("subjects", "/subjects", user),
        Route::new("subjectDetail", "/subjects/:id", user),
        Route::new("chapterQuizzes", "/chapters/:id/quizzes", user),
        Route::new("quizView", "/quizzes/:id", user),
        Route::new("quizAttempt", "/attempts/:id/take", user),
        Route::new("quizResult", "/attempts/:id", user),
        Route::new("quizAttempts", "/attempts", user),
        Route::new("notFound", "*", RouteMeta::PUBLIC),
    ])
}
