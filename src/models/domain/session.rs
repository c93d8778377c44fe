use chrono::{DateTime, Utc};

use crate::models::domain::user::{UserProfile, UserRole};

/// Everything the client remembers about the signed-in account.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub role: Option<UserRole>,
    pub user: Option<UserProfile>,
    pub login_time: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: String, role: UserRole, user: Option<UserProfile>) -> Self {
        Self {
            token: Some(token),
            role: Some(role),
            user,
            login_time: Some(Utc::now()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.role.is_none() && self.user.is_none() && self.login_time.is_none()
    }
}
