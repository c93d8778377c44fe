use std::borrow::Cow;

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};
use validator::{Validate, ValidationError};

use crate::models::domain::UserRole;

fn expose_password<S: Serializer>(password: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(password.expose_secret())
}

fn required(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_login(request: &LoginRequest) -> Result<(), ValidationError> {
    if request.login_name().map_or(true, |name| name.trim().is_empty()) {
        return Err(match request.role {
            UserRole::Admin => required("username_required", "Username is required"),
            UserRole::User => required("email_required", "Email is required"),
        });
    }
    if request.password.expose_secret().is_empty() {
        return Err(required("password_required", "Password is required"));
    }
    Ok(())
}

fn validate_register(request: &RegisterRequest) -> Result<(), ValidationError> {
    if request.password.expose_secret().is_empty() {
        return Err(required("password_required", "Password is required"));
    }
    Ok(())
}

/// Body of `POST /auth/login`. Admins sign in by username, learners by email.
#[derive(Debug, Clone, Serialize, Validate)]
#[validate(schema(function = "validate_login"))]
pub struct LoginRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(serialize_with = "expose_password")]
    pub password: SecretString,
    pub role: UserRole,
}

impl LoginRequest {
    pub fn user(email: &str, password: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            username: None,
            password: SecretString::from(password.to_string()),
            role: UserRole::User,
        }
    }

    pub fn admin(username: &str, password: &str) -> Self {
        Self {
            email: None,
            username: Some(username.to_string()),
            password: SecretString::from(password.to_string()),
            role: UserRole::Admin,
        }
    }

    /// The identifier the backend looks the account up by.
    pub fn login_name(&self) -> Option<&str> {
        match self.role {
            UserRole::Admin => self.username.as_deref(),
            UserRole::User => self.email.as_deref(),
        }
    }
}

/// Body of `POST /auth/register`; every field is required by the backend.
#[derive(Debug, Clone, Serialize, Validate)]
#[validate(schema(function = "validate_register", skip_on_field_errors = false))]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(serialize_with = "expose_password")]
    pub password: SecretString,

    #[validate(length(min = 1, max = 100))]
    pub full_name: String,

    #[validate(length(min = 1, max = 100))]
    pub qualification: String,

    pub date_of_birth: NaiveDate,
}
