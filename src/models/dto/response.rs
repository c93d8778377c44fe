use serde::{Deserialize, Serialize};

use crate::models::domain::{UserProfile, UserRole};

/// Body of a successful `POST /auth/login`. Every field is optional on the
/// wire; the auth service decides what a usable response is.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateResponse {
    #[serde(default)]
    pub valid: bool,
}
