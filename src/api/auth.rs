// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `/v1/auth` endpoints.

use crate::error::Result;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, User};
use crate::services::client::{ApiClient, ApiRequest};
use serde::de::IgnoredAny;
use std::sync::Arc;
use validator::Validate;

pub const LOGIN_PATH: &str = "/v1/auth/login";
pub const REGISTER_PATH: &str = "/v1/auth/register";
pub const LOGOUT_PATH: &str = "/v1/auth/logout";

/// Authentication endpoints.
#[derive(Clone)]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Exchange credentials for a session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        tracing::debug!(email = %request.email, "Logging in");
        self.client
            .fetch(ApiRequest::post(LOGIN_PATH).json(&request)?)
            .await
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        request.validate()?;
        self.client
            .fetch(ApiRequest::post(REGISTER_PATH).json(request)?)
            .await
    }

    /// Obtain a new access token through the shared refresh path.
    pub async fn refresh(&self) -> Result<String> {
        self.client.refresh_access_token().await
    }

    /// Tell the backend the session is over. `token` is sent explicitly
    /// because the store may already be cleared.
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.client
            .send::<IgnoredAny>(ApiRequest::post(LOGOUT_PATH).bearer(token))
            .await?;
        Ok(())
    }
}
