use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Backend unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("No authentication token received")]
    MissingToken,

    #[error("Token validation failed: {0}")]
    ValidationFailure(String),

    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unexpected response: {0}")]
    DecodeError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ClientError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::NetworkUnavailable(_) => "NETWORK_UNAVAILABLE",
            ClientError::Unauthorized(_) => "UNAUTHORIZED",
            ClientError::MissingToken => "MISSING_TOKEN",
            ClientError::ValidationFailure(_) => "VALIDATION_FAILURE",
            ClientError::ServerError { .. } => "SERVER_ERROR",
            ClientError::InvalidRequest(_) => "INVALID_REQUEST",
            ClientError::DecodeError(_) => "DECODE_ERROR",
            ClientError::StorageError(_) => "STORAGE_ERROR",
            ClientError::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// Message suitable for showing to the user as-is.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::NetworkUnavailable(_) => {
                "The server is unreachable. Check your connection and try again.".to_string()
            }
            ClientError::Unauthorized(_) => "Your session has expired. Please log in again.".to_string(),
            ClientError::ServerError { message, .. } => message.clone(),
            ClientError::InvalidRequest(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Whether retrying the same call later could succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::NetworkUnavailable(_))
    }

    /// Builds a `ServerError` from a status and a raw response body, preferring
    /// the message the backend put in the body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()))
            });

        ClientError::ServerError {
            status: status.as_u16(),
            message,
        }
    }
}

/// Error payload shapes the backend may return.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        [self.msg, self.error, self.message]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return ClientError::ConfigError(err.to_string());
        }
        if err.is_timeout() || err.is_connect() || err.is_request() {
            return ClientError::NetworkUnavailable(err.to_string());
        }
        match err.status() {
            Some(status) => ClientError::from_response(status, ""),
            None if err.is_decode() => ClientError::DecodeError(err.to_string()),
            None => ClientError::NetworkUnavailable(err.to_string()),
        }
    }
}
impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::DecodeError(err.to_string())
    }
}
impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::InvalidRequest(err.to_string())
    }
}
impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::StorageError(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
