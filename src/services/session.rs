// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token decoding.
//!
//! Reads the claims segment of a compact token without verifying its
//! signature; the backend is the authority on validity. Every failure here
//! fails closed: an undecodable token is expired and has no identity.

use crate::models::{Claims, Identity, Role};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Tokens within this many seconds of expiry are already treated as expired.
pub const EXPIRY_BUFFER_SECS: i64 = 30;

/// Why a token could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("token does not have three segments")]
    Malformed,

    #[error("claims segment is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("claims segment is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing or invalid claim: {0}")]
    MissingClaim(&'static str),
}

/// Raw claims as they appear on the wire, before field-name fallbacks.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<Value>,
    id: Option<Value>,
    user_id: Option<Value>,
    email: Option<String>,
    role: Option<Role>,
    iat: Option<i64>,
    exp: Option<i64>,
    first_name: Option<String>,
    #[serde(rename = "firstName")]
    first_name_camel: Option<String>,
    last_name: Option<String>,
    #[serde(rename = "lastName")]
    last_name_camel: Option<String>,
    is_active: Option<bool>,
    #[serde(rename = "isActive")]
    is_active_camel: Option<bool>,
    avatar: Option<String>,
}

fn subject_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Base64url-decode the middle segment of a compact token.
fn claims_segment(token: &str) -> Result<Vec<u8>, DecodeError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(DecodeError::Malformed);
    };

    if payload.is_empty() {
        return Err(DecodeError::Malformed);
    }

    Ok(URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?)
}

/// Decode the full claims set, applying field-name fallbacks.
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let raw: RawClaims = serde_json::from_slice(&claims_segment(token)?)?;

    let subject = raw
        .sub
        .and_then(subject_string)
        .or_else(|| raw.id.and_then(subject_string))
        .or_else(|| raw.user_id.and_then(subject_string))
        .ok_or(DecodeError::MissingClaim("sub"))?;

    Ok(Claims {
        subject,
        email: raw.email.ok_or(DecodeError::MissingClaim("email"))?,
        role: raw.role.ok_or(DecodeError::MissingClaim("role"))?,
        iat: raw.iat.ok_or(DecodeError::MissingClaim("iat"))?,
        exp: raw.exp.ok_or(DecodeError::MissingClaim("exp"))?,
        first_name: raw.first_name.or(raw.first_name_camel),
        last_name: raw.last_name.or(raw.last_name_camel),
        is_active: raw.is_active.or(raw.is_active_camel),
        avatar: raw.avatar,
    })
}

/// Only the expiry claim; other claims may be absent.
fn decode_exp(token: &str) -> Result<i64, DecodeError> {
    #[derive(Deserialize)]
    struct Expiry {
        exp: Option<i64>,
    }

    let expiry: Expiry = serde_json::from_slice(&claims_segment(token)?)?;
    expiry.exp.ok_or(DecodeError::MissingClaim("exp"))
}

/// True if the token cannot be decoded or expires within the buffer.
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, Utc::now())
}

/// [`is_token_expired`] against an explicit clock.
pub fn is_token_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    match decode_exp(token) {
        Ok(exp) => exp.saturating_sub(EXPIRY_BUFFER_SECS) <= now.timestamp(),
        Err(e) => {
            tracing::debug!(error = %e, "Treating undecodable token as expired");
            true
        }
    }
}

/// Identity carried by the token, or `None` if it cannot be decoded.
pub fn user_from_token(token: &str) -> Option<Identity> {
    match decode_claims(token) {
        Ok(claims) => Identity::from_claims(&claims),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to decode identity from token");
            None
        }
    }
}

/// When the token expires, per its `exp` claim.
pub fn token_expiration(token: &str) -> Option<DateTime<Utc>> {
    decode_exp(token)
        .ok()
        .and_then(|exp| DateTime::from_timestamp(exp, 0))
}

/// Seconds until the token expires, zero if already expired or undecodable.
pub fn time_until_expiration(token: &str) -> u64 {
    time_until_expiration_at(token, Utc::now())
}

/// [`time_until_expiration`] against an explicit clock.
pub fn time_until_expiration_at(token: &str, now: DateTime<Utc>) -> u64 {
    decode_exp(token)
        .map(|exp| exp.saturating_sub(now.timestamp()).max(0) as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with(claims: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_malformed_tokens_are_expired() {
        for token in ["", "abc", "a.b", "a..c", "a.b.c.d", "a.!!!.c"] {
            assert!(is_token_expired(token), "{:?} should be expired", token);
            assert!(user_from_token(token).is_none());
        }
    }

    #[test]
    fn test_subject_fallbacks() {
        let token = token_with(json!({
            "user_id": 77,
            "email": "a@example.com",
            "role": "user",
            "iat": 1_700_000_000,
            "exp": 1_700_003_600
        }));
        assert_eq!(decode_claims(&token).unwrap().subject, "77");

        let token = token_with(json!({
            "sub": "s-1",
            "id": "i-1",
            "email": "a@example.com",
            "role": "user",
            "iat": 1_700_000_000,
            "exp": 1_700_003_600
        }));
        assert_eq!(decode_claims(&token).unwrap().subject, "s-1");
    }

    #[test]
    fn test_missing_exp_is_expired() {
        let token = token_with(json!({ "sub": "1", "email": "a@example.com", "role": "user", "iat": 1 }));
        assert!(is_token_expired(&token));
        assert_eq!(token_expiration(&token), None);
        assert_eq!(time_until_expiration(&token), 0);
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = base64::engine::general_purpose::URL_SAFE.encode(
            json!({ "sub": "1", "email": "a@example.com", "role": "admin", "iat": 1, "exp": 2 })
                .to_string(),
        );
        let token = format!("{}.{}.sig", header, payload);
        assert_eq!(decode_claims(&token).unwrap().role, Role::Admin);
    }

    #[test]
    fn test_expiry_uses_buffer() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let claims = |exp: i64| {
            token_with(json!({ "sub": "1", "email": "a@example.com", "role": "user", "iat": 1, "exp": exp }))
        };

        assert!(!is_token_expired_at(&claims(1_700_000_031), now));
        assert!(is_token_expired_at(&claims(1_700_000_030), now));
        assert!(is_token_expired_at(&claims(1_700_000_029), now));
        assert_eq!(time_until_expiration_at(&claims(1_700_000_045), now), 45);
        assert_eq!(time_until_expiration_at(&claims(1_699_999_000), now), 0);
    }
}
