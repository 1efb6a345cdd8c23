// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated HTTP client for the admin backend.
//!
//! Handles:
//! - Bearer token attachment from the token store
//! - Envelope decoding and error mapping
//! - Silent token refresh when a request comes back 401
//! - Parking concurrent 401s behind the single in-flight refresh
//! - Ending the session (clear tokens, go to login) when refresh fails

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{Envelope, RefreshRequest, TokenResponse};
use crate::services::navigator::{self, Navigator};
use crate::services::token_store::TokenStore;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, oneshot};

/// Token refresh endpoint.
pub const REFRESH_PATH: &str = "/v1/auth/refresh";

/// Requests under this prefix never trigger a refresh.
const AUTH_PREFIX: &str = "/v1/auth/";

const EVENT_CAPACITY: usize = 16;

/// Session lifecycle changes observed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A refresh succeeded and a new token is in the store.
    Refreshed,
    /// A refresh failed; tokens were cleared.
    Expired,
}

/// Outbound request description.
///
/// Kept separate from `reqwest::RequestBuilder` so the same request can be
/// rebuilt for its retry after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::unknown(format!("Failed to encode request body: {}", e), 0))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Send with this token instead of the stored one.
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn is_auth_endpoint(&self) -> bool {
        self.path.starts_with(AUTH_PREFIX)
    }
}

type Waiter = oneshot::Sender<Result<String>>;

/// `refreshing == false` is idle.
#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    queue: Vec<Waiter>,
}

/// HTTP client for the admin backend.
///
/// At most one refresh call is in flight at any time. Requests that come
/// back 401 while it runs are parked in a queue and retried once with the
/// new token, or rejected with the refresh error.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    login_path: String,
    store: TokenStore,
    navigator: Arc<dyn Navigator>,
    refresh: Mutex<RefreshState>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(config: &Config, store: TokenStore, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout);
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::unknown(format!("Failed to build HTTP client: {}", e), 0))?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        tracing::info!(
            api_url = %config.api_url,
            timeout_secs = config.request_timeout.as_secs(),
            "API client initialized"
        );

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            login_path: config.login_path.clone(),
            store,
            navigator,
            refresh: Mutex::new(RefreshState::default()),
            events,
        })
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Receive refresh outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock_refresh().refreshing
    }

    /// Number of requests parked behind the current refresh.
    pub fn queued_requests(&self) -> usize {
        self.lock_refresh().queue.len()
    }

    /// Send a request and decode the envelope.
    ///
    /// A 401 on a non-auth endpoint recovers the session and retries the
    /// request exactly once; a second 401 is returned to the caller.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Envelope<T>> {
        let token = request.bearer.clone().or_else(|| self.store.token());
        let response = self.execute(&request, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || request.is_auth_endpoint() {
            return decode_envelope(response).await;
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            "Request unauthorized, recovering session"
        );

        let fresh = self.recover_token(token.as_deref()).await?;
        let retry = self.execute(&request, Some(&fresh)).await?;
        decode_envelope(retry).await
    }

    /// Send a request and return its `data`, which must be present.
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send(request).await?.into_data()
    }

    /// Get a token to retry with after a 401.
    async fn recover_token(&self, used: Option<&str>) -> Result<String> {
        match (used, self.store.token()) {
            (Some(used), Some(current)) if used != current => {
                // Another request already refreshed while this one was in flight.
                tracing::debug!("Token replaced while request was in flight, reusing it");
                Ok(current)
            }
            (None, Some(current)) => Ok(current),
            (Some(_), None) => Err(ApiError::session_expired()),
            _ => self.refresh_access_token().await,
        }
    }

    /// Obtain a new access token, joining the in-flight refresh if any.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let parked = {
            let mut state = self.lock_refresh();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.queue.push(tx);
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        if let Some(rx) = parked {
            tracing::debug!("Refresh already in flight, parking request");
            return rx.await.unwrap_or_else(|_| Err(refresh_cancelled()));
        }

        let generation = self.store.generation();
        let guard = RefreshGuard {
            client: self,
            armed: true,
        };
        let outcome = self.request_new_token(generation).await;
        guard.settle(&outcome, generation);
        outcome
    }

    async fn request_new_token(&self, generation: u64) -> Result<String> {
        let access = self.store.token();
        let credential = self
            .store
            .refresh_token()
            .or_else(|| access.clone())
            .ok_or_else(|| {
                tracing::debug!("No stored token to refresh with");
                ApiError::session_expired()
            })?;

        tracing::info!("Refreshing session token");

        let request = ApiRequest::post(REFRESH_PATH).json(&RefreshRequest { token: &credential })?;
        let response = self.execute(&request, access.as_deref()).await?;
        let issued: TokenResponse = decode_envelope(response).await?.into_data()?;

        let stored = self.store.replace_if_current(
            generation,
            &issued.token,
            issued.refresh_token.as_deref(),
        );
        if !stored {
            tracing::info!("Session changed during token refresh, discarding new token");
            return Err(ApiError::session_expired());
        }

        Ok(issued.token)
    }

    /// Apply the refresh outcome, then wake every parked request.
    ///
    /// A failure ends the session only if it is still the one the refresh
    /// started under; a logout or new login in the meantime is left alone.
    fn finish_refresh(&self, outcome: &Result<String>, generation: u64) {
        match outcome {
            Ok(_) => {
                tracing::info!("Session token refreshed");
                let _ = self.events.send(SessionEvent::Refreshed);
            }
            Err(e) if self.store.clear_if_current(generation) => {
                tracing::warn!(status = e.status, error = %e, "Token refresh failed, ending session");
                self.redirect_to_login();
                let _ = self.events.send(SessionEvent::Expired);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token refresh failed for a session that already ended");
            }
        }
        self.release_waiters(outcome);
    }

    /// Return to idle and resolve parked requests in the order they arrived.
    fn release_waiters(&self, outcome: &Result<String>) {
        let waiters = {
            let mut state = self.lock_refresh();
            state.refreshing = false;
            std::mem::take(&mut state.queue)
        };

        if !waiters.is_empty() {
            tracing::debug!(count = waiters.len(), ok = outcome.is_ok(), "Releasing parked requests");
        }

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    fn redirect_to_login(&self) {
        let current = self.navigator.current_path();
        if navigator::is_at(&current, &self.login_path) {
            tracing::debug!("Already at login, not redirecting");
            return;
        }

        tracing::info!(from = %current, to = %self.login_path, "Redirecting to login");
        self.navigator.navigate(&self.login_path);
    }

    async fn execute(&self, request: &ApiRequest, token: Option<&str>) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(|e| {
            tracing::warn!(
                error = %e,
                method = %request.method,
                path = %request.path,
                "No response from backend"
            );
            ApiError::network(&e)
        })
    }

    fn lock_refresh(&self) -> MutexGuard<'_, RefreshState> {
        self.refresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Settles the refresh even if the driving future is dropped mid-flight.
struct RefreshGuard<'a> {
    client: &'a ApiClient,
    armed: bool,
}

impl RefreshGuard<'_> {
    fn settle(mut self, outcome: &Result<String>, generation: u64) {
        self.armed = false;
        self.client.finish_refresh(outcome, generation);
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Token refresh abandoned before completion");
            self.client.release_waiters(&Err(refresh_cancelled()));
        }
    }
}

fn refresh_cancelled() -> ApiError {
    ApiError::unknown("Token refresh was cancelled", 0)
}

/// Check response status and decode the envelope body.
async fn decode_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<Envelope<T>> {
    let status = response.status();
    let body = response.text().await.map_err(|e| ApiError::network(&e))?;

    if !status.is_success() {
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Backend rate limit hit (429)");
        }
        return Err(ApiError::from_response(status.as_u16(), &body));
    }

    let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
        tracing::warn!(error = %e, status = status.as_u16(), "Undecodable response body");
        ApiError::unknown(format!("Invalid response from server: {}", e), status.as_u16())
    })?;

    if !envelope.success {
        return Err(ApiError::new(
            if envelope.message.is_empty() {
                "Request was not successful".to_string()
            } else {
                envelope.message
            },
            status.as_u16(),
            None,
        ));
    }

    Ok(envelope)
}
