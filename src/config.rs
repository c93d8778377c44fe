use std::{env, path::PathBuf, time::Duration};

use crate::errors::{ClientError, ClientResult};

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub login_timeout: Duration,
    pub session_file: PathBuf,
    pub login_route: String,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("QUIZ_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000/api".to_string()),
            request_timeout: Duration::from_secs(
                env::var("QUIZ_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            login_timeout: Duration::from_secs(
                env::var("QUIZ_LOGIN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            session_file: env::var("QUIZ_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".quiz-session.json")),
            login_route: env::var("QUIZ_LOGIN_ROUTE").unwrap_or_else(|_| "/login".to_string()),
        }
    }

    /// Rejects settings the client cannot work with.
    pub fn validate(&self) -> ClientResult<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ClientError::ConfigError("QUIZ_API_URL is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "QUIZ_API_URL must be an http(s) URL, got '{}'",
                url
            )));
        }
        if self.request_timeout.is_zero() || self.login_timeout.is_zero() {
            return Err(ClientError::ConfigError(
                "request timeouts must be greater than zero".to_string(),
            ));
        }
        if !self.login_route.starts_with('/') {
            return Err(ClientError::ConfigError(format!(
                "QUIZ_LOGIN_ROUTE must be an absolute path, got '{}'",
                self.login_route
            )));
        }
        Ok(())
    }

    /// Same settings pointed at another backend, used by tests and tools.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000/api".to_string(),
            request_timeout: Duration::from_secs(2),
            login_timeout: Duration::from_secs(1),
            session_file: PathBuf::from("test-session.json"),
            login_route: "/login".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            request_timeout: Duration::from_secs(10),
            login_timeout: Duration::from_secs(5),
            session_file: PathBuf::from(".quiz-session.json"),
            login_route: "/login".to_string(),
        }
    }
}
