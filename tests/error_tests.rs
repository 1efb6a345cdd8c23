// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use admin_console::error::ApiError;

#[test]
fn test_from_response_reads_message_and_code() {
    let err = ApiError::from_response(
        400,
        r#"{"success":false,"message":"Email is required","code":"MISSING_FIELD"}"#,
    );
    assert_eq!(err.status, 400);
    assert_eq!(err.message, "Email is required");
    assert_eq!(err.code.as_deref(), Some("MISSING_FIELD"));
}

#[test]
fn test_from_response_falls_back() {
    let err = ApiError::from_response(502, "<html>Bad Gateway</html>");
    assert_eq!(err.message, "Request failed with status 502");
    assert_eq!(err.code, None);

    let err = ApiError::from_response(500, r#"{"error":"boom"}"#);
    assert_eq!(err.message, "boom");
}

#[test]
fn test_user_message_mapping() {
    assert_eq!(
        ApiError::from_response(409, r#"{"message":"duplicate"}"#).user_message(),
        "A user with this email already exists."
    );
    assert_eq!(
        ApiError::from_response(500, r#"{"message":"User already exists"}"#).user_message(),
        "A user with this email already exists."
    );
    assert_eq!(
        ApiError::from_response(500, r#"{"message":"Database down"}"#).user_message(),
        "Database down"
    );
    assert_eq!(
        ApiError::from_response(403, "").user_message(),
        "You do not have permission to perform this action."
    );
}

#[test]
fn test_session_expired_is_unauthorized() {
    let err = ApiError::session_expired();
    assert!(err.is_unauthorized());
    assert!(!err.is_network_error());
    assert_eq!(err.code.as_deref(), Some(ApiError::SESSION_EXPIRED));
}

#[test]
fn test_unknown_is_not_network() {
    let err = ApiError::unknown("Invalid response from server", 0);
    assert_eq!(err.status, 0);
    assert!(!err.is_network_error());
    assert_eq!(err.user_message(), "Invalid response from server");
}
