// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth session: the state machine the UI consults.
//!
//! Owns the current [`AuthState`], drives it through [`reduce`], and keeps
//! it in step with refresh outcomes reported by the [`ApiClient`].

use crate::api::AuthApi;
use crate::error::{ApiError, Result};
use crate::models::{Identity, Permission, RegisterRequest, Role, User};
use crate::services::auth_state::{reduce, AuthAction, AuthState};
use crate::services::client::{ApiClient, SessionEvent};
use crate::services::session;
use crate::services::token_store::TokenStore;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Session state shared with the UI.
///
/// Created with [`AuthSession::start`]; dropping it stops the background
/// listener that follows token refreshes.
pub struct AuthSession {
    client: Arc<ApiClient>,
    auth: AuthApi,
    state: Arc<watch::Sender<AuthState>>,
    listener: Option<JoinHandle<()>>,
}

impl AuthSession {
    /// Restore the session from the token store, without network calls.
    ///
    /// When called inside a Tokio runtime, also starts following the
    /// client's refresh outcomes.
    pub fn start(client: Arc<ApiClient>) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        let state = Arc::new(state);

        dispatch(&state, restore(client.store()));

        let listener = match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(handle.spawn(follow_client(
                client.subscribe(),
                client.store().clone(),
                Arc::clone(&state),
            ))),
            Err(_) => {
                tracing::debug!("No async runtime, session will not follow token refreshes");
                None
            }
        };

        Self {
            auth: AuthApi::new(client.clone()),
            client,
            state,
            listener,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<Identity> {
        self.state.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error().map(str::to_string)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.state.borrow().user().is_some_and(|u| u.role == role)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.state
            .borrow()
            .user()
            .is_some_and(|u| u.role.grants(permission))
    }

    /// Sign in. On failure the error is recorded in the state and also
    /// returned so the caller can react.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        self.dispatch(AuthAction::LoginStart);

        match self.try_login(email, password).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "Login successful");
                self.dispatch(AuthAction::LoginSuccess(user.clone()));
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(status = e.status, error = %e, "Login failed");
                let message = if e.is_network_error() {
                    e.user_message()
                } else {
                    e.message.clone()
                };
                self.dispatch(AuthAction::LoginFailure(message));
                Err(e)
            }
        }
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<Identity> {
        let issued = self.auth.login(email, password).await?;
        let user = session::user_from_token(&issued.token).ok_or_else(|| {
            ApiError::unknown("Server returned an unreadable session token", 200)
        })?;

        self.client
            .store()
            .start_session(&issued.token, issued.refresh_token.as_deref());

        Ok(user)
    }

    /// Create an account. The session is unchanged.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.auth.register(request).await
    }

    /// End the session locally and notify the backend in the background.
    pub fn logout(&self) {
        if let Some(token) = self.client.store().token() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let auth = self.auth.clone();
                    handle.spawn(async move {
                        if let Err(e) = auth.logout(&token).await {
                            tracing::debug!(error = %e, "Logout notification failed");
                        }
                    });
                }
                Err(_) => tracing::debug!("No async runtime, skipping logout notification"),
            }
        }

        self.client.store().clear();
        self.dispatch(AuthAction::Logout);
        tracing::info!("Logged out");
    }

    /// Refresh the token and re-derive the identity.
    ///
    /// On failure this logs out, which leaves the state logged out with no
    /// error whatever order the client's expiry event arrives in.
    pub async fn refresh_user(&self) -> Result<Identity> {
        let refreshed = async {
            let token = self.client.refresh_access_token().await?;
            session::user_from_token(&token).ok_or_else(|| {
                ApiError::unknown("Server returned an unreadable session token", 200)
            })
        }
        .await;

        match refreshed {
            Ok(user) => {
                self.dispatch(AuthAction::TokenRefreshed(user.clone()));
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh user, logging out");
                self.logout();
                Err(e)
            }
        }
    }

    pub fn clear_error(&self) {
        self.dispatch(AuthAction::ClearError);
    }

    fn dispatch(&self, action: AuthAction) {
        dispatch(&self.state, action);
    }
}

impl Drop for AuthSession {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

fn dispatch(state: &watch::Sender<AuthState>, action: AuthAction) {
    state.send_modify(|current| {
        let previous = std::mem::take(current);
        *current = reduce(previous, action);
    });
}

/// Decide the startup transition from what is in the store.
fn restore(store: &TokenStore) -> AuthAction {
    let Some(token) = store.token() else {
        return AuthAction::SessionMissing;
    };

    if session::is_token_expired(&token) {
        tracing::info!("Stored session token expired, clearing");
        store.clear();
        return AuthAction::SessionMissing;
    }

    match session::user_from_token(&token) {
        Some(user) => {
            tracing::info!(
                user_id = %user.id,
                expires_in_secs = session::time_until_expiration(&token),
                "Session restored from stored token"
            );
            AuthAction::SessionRestored(user)
        }
        None => {
            tracing::warn!("Stored session token has unreadable claims, clearing");
            store.clear();
            AuthAction::SessionMissing
        }
    }
}

/// Mirror client refresh outcomes into the auth state.
async fn follow_client(
    mut events: tokio::sync::broadcast::Receiver<SessionEvent>,
    store: TokenStore,
    state: Arc<watch::Sender<AuthState>>,
) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::Refreshed) => {
                if let Some(user) = store.token().and_then(|t| session::user_from_token(&t)) {
                    dispatch(&state, AuthAction::TokenRefreshed(user));
                }
            }
            Ok(SessionEvent::Expired) => dispatch(&state, AuthAction::SessionExpired),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Session event listener lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
