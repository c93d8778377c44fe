use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::domain::user::UserRole;

/// Claims read from the payload segment of an access token. Nothing here is
/// trusted: the signature is only checked by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<f64>, // Expiration time (UTC epoch seconds, may be fractional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Value>, // Plain id, or the backend's {id, role} identity object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Account identity the backend embeds in the subject claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub id: Option<i64>,
    pub role: Option<UserRole>,
}

impl TokenClaims {
    pub fn identity(&self) -> Option<TokenIdentity> {
        match self.sub.as_ref()? {
            Value::Object(fields) => Some(TokenIdentity {
                id: fields.get("id").and_then(Value::as_i64),
                role: fields
                    .get("role")
                    .and_then(Value::as_str)
                    .and_then(|r| r.parse().ok()),
            }),
            Value::Number(n) => Some(TokenIdentity {
                id: n.as_i64(),
                role: None,
            }),
            Value::String(s) => Some(TokenIdentity {
                id: s.parse().ok(),
                role: None,
            }),
            _ => None,
        }
    }
}
