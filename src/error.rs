// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error type surfaced to callers of the admin API client.

use serde::Deserialize;

/// Structured API error.
///
/// `status` is the HTTP status of the failed response, or `0` when no
/// response arrived at all (connection failure, timeout).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status: u16,
    pub code: Option<String>,
}

/// Error body the backend sends alongside non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiError {
    /// No response was received (connection refused, DNS, timeout).
    pub const NETWORK_ERROR: &'static str = "NETWORK_ERROR";
    /// A response arrived but could not be understood.
    pub const UNKNOWN_ERROR: &'static str = "UNKNOWN_ERROR";
    /// Client-side payload validation failed before sending.
    pub const VALIDATION_ERROR: &'static str = "VALIDATION_ERROR";
    /// The session was torn down and cannot be recovered without a login.
    pub const SESSION_EXPIRED: &'static str = "SESSION_EXPIRED";

    pub fn new(message: impl Into<String>, status: u16, code: Option<&str>) -> Self {
        Self {
            message: message.into(),
            status,
            code: code.map(str::to_string),
        }
    }

    /// Transport-level failure: no HTTP response.
    pub fn network(err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "Request timed out. Please try again."
        } else {
            "Network error. Please check your connection."
        };
        Self::new(message, 0, Some(Self::NETWORK_ERROR))
    }

    pub fn unknown(message: impl Into<String>, status: u16) -> Self {
        Self::new(message, status, Some(Self::UNKNOWN_ERROR))
    }

    pub fn session_expired() -> Self {
        Self::new(
            "Your session has expired. Please sign in again.",
            401,
            Some(Self::SESSION_EXPIRED),
        )
    }

    /// Build an error from a non-2xx response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status {}", status));

        Self {
            message,
            status,
            code: parsed.code,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_network_error(&self) -> bool {
        self.status == 0 && self.code.as_deref() == Some(Self::NETWORK_ERROR)
    }

    /// Message suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> String {
        let already_exists = self.message.to_lowercase().contains("already exists");
        match self.status {
            0 if self.is_network_error() => {
                "Unable to reach the server. Please check your connection.".to_string()
            }
            400 if self.message.trim().is_empty() => {
                "Please check the submitted information.".to_string()
            }
            401 => "Your session has expired. Please sign in again.".to_string(),
            403 => "You do not have permission to perform this action.".to_string(),
            404 => "The requested resource was not found.".to_string(),
            409 => "A user with this email already exists.".to_string(),
            500 if already_exists => "A user with this email already exists.".to_string(),
            _ => self.message.clone(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", e.code))
            })
            .collect();
        messages.sort();
        messages.dedup();

        Self::new(messages.join("; "), 400, Some(Self::VALIDATION_ERROR))
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_uses_envelope_message() {
        let err = ApiError::from_response(
            400,
            r#"{"success":false,"message":"Email is required","data":null}"#,
        );
        assert_eq!(err.status, 400);
        assert_eq!(err.message, "Email is required");
        assert_eq!(err.code, None);
    }

    #[test]
    fn test_from_response_keeps_server_code() {
        let err = ApiError::from_response(403, r#"{"message":"Nope","code":"FORBIDDEN"}"#);
        assert_eq!(err.code.as_deref(), Some("FORBIDDEN"));
    }

    #[test]
    fn test_from_response_non_json_body() {
        let err = ApiError::from_response(502, "<html>Bad Gateway</html>");
        assert_eq!(err.message, "Request failed with status 502");
        assert_eq!(err.status, 502);
    }

    #[test]
    fn test_user_message_conflict() {
        let err = ApiError::new("User already exists", 500, None);
        assert_eq!(err.user_message(), "A user with this email already exists.");

        let err = ApiError::new("Internal failure", 500, None);
        assert_eq!(err.user_message(), "Internal failure");
    }

    #[test]
    fn test_session_expired_is_unauthorized() {
        let err = ApiError::session_expired();
        assert!(err.is_unauthorized());
        assert!(!err.is_network_error());
    }
}
