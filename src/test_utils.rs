#[cfg(test)]
pub mod fixtures {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use chrono::{Duration, NaiveDate, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use secrecy::SecretString;
    use serde_json::Value;

    use crate::models::{domain::UserProfile, dto::RegisterRequest};

    /// HS256 token over `claims`, signed with a throwaway key.
    pub fn signed_token(claims: Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test_jwt_secret_key"),
        )
        .expect("test claims should encode")
    }

    /// Token whose payload segment is `payload`, base64url-encoded verbatim.
    pub fn token_with_payload(payload: &[u8]) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    /// Token for a learner that expires in an hour.
    pub fn valid_token() -> String {
        signed_token(serde_json::json!({
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
            "sub": {"id": 1, "role": "user"}
        }))
    }

    /// Token that expired an hour ago.
    pub fn expired_token() -> String {
        signed_token(serde_json::json!({
            "exp": (Utc::now() - Duration::hours(1)).timestamp(),
            "sub": {"id": 1, "role": "user"}
        }))
    }

    pub fn profile(value: Value) -> UserProfile {
        serde_json::from_value(value).expect("test profile should be a JSON object")
    }

    pub fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: SecretString::from("s3cret".to_string()),
            full_name: "Ada Lovelace".to_string(),
            qualification: "BSc Mathematics".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1999, 4, 12).expect("valid date"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::auth::token::{decode_expiry, is_token_valid};

    #[test]
    fn test_fixtures_valid_token() {
        let token = valid_token();
        assert!(decode_expiry(&token).is_some());
        assert!(is_token_valid(&token));
    }

    #[test]
    fn test_fixtures_expired_token() {
        assert!(!is_token_valid(&expired_token()));
    }

    #[test]
    fn test_fixtures_register_request() {
        let request = register_request("custom@example.com");
        assert_eq!(request.email, "custom@example.com");
        assert_eq!(request.full_name, "Ada Lovelace");
    }
}
