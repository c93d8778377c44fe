//! Reading compact signed tokens on the client.
//!
//! Only the payload segment is decoded. Any malformed input degrades to
//! "invalid", never to a panic.

use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine as _,
};
use chrono::{DateTime, Utc};

use crate::{
    auth::claims::TokenClaims,
    errors::{ClientError, ClientResult},
};

/// base64url that accepts payloads with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn decode_claims(token: &str) -> ClientResult<TokenClaims> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        return Err(ClientError::ValidationFailure(format!(
            "expected 3 non-empty segments, found {}",
            segments.iter().filter(|s| !s.is_empty()).count()
        )));
    }

    let payload = URL_SAFE_LENIENT
        .decode(segments[1])
        .map_err(|e| ClientError::ValidationFailure(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice::<TokenClaims>(&payload)
        .map_err(|e| ClientError::ValidationFailure(format!("payload is not a claims object: {}", e)))
}

/// Expiry of `token` in whole epoch seconds (fractions truncated), or `None`
/// if it cannot be read.
pub fn decode_expiry(token: &str) -> Option<i64> {
    decode_claims(token).ok()?.exp.map(|exp| exp.floor() as i64)
}

/// True when the token's expiry is strictly after `now`, compared in
/// milliseconds. Fractional `exp` values are honored.
pub fn is_token_valid_at(token: &str, now: DateTime<Utc>) -> bool {
    match decode_claims(token).ok().and_then(|claims| claims.exp) {
        Some(exp) => exp * 1000.0 > now.timestamp_millis() as f64,
        None => false,
    }
}

pub fn is_token_valid(token: &str) -> bool {
    is_token_valid_at(token, Utc::now())
}
