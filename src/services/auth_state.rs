// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth state and its transition function.

use crate::models::Identity;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Message shown after the backend refused to refresh the session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Where the session currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Startup, or a login is in progress.
    #[default]
    Loading,
    Authenticated { user: Identity },
    /// No session. Carries the last error, if any.
    LoggedOut { error: Option<String> },
}

/// Input to [`reduce`].
#[derive(Debug, Clone)]
pub enum AuthAction {
    LoginStart,
    LoginSuccess(Identity),
    LoginFailure(String),
    /// A valid stored token was found at startup.
    SessionRestored(Identity),
    /// No usable stored token at startup.
    SessionMissing,
    TokenRefreshed(Identity),
    /// The client could not refresh and ended the session. No effect once
    /// logged out.
    SessionExpired,
    Logout,
    ClearError,
}

/// Apply `action` to `state`.
pub fn reduce(state: AuthState, action: AuthAction) -> AuthState {
    match action {
        AuthAction::LoginStart => AuthState::Loading,
        AuthAction::LoginSuccess(user)
        | AuthAction::SessionRestored(user)
        | AuthAction::TokenRefreshed(user) => AuthState::Authenticated { user },
        AuthAction::LoginFailure(error) => AuthState::LoggedOut { error: Some(error) },
        // Already logged out: the expiry adds nothing the user must see.
        AuthAction::SessionExpired => match state {
            AuthState::LoggedOut { error } => AuthState::LoggedOut { error },
            AuthState::Loading | AuthState::Authenticated { .. } => AuthState::LoggedOut {
                error: Some(SESSION_EXPIRED_MESSAGE.to_string()),
            },
        },
        AuthAction::SessionMissing | AuthAction::Logout => AuthState::LoggedOut { error: None },
        AuthAction::ClearError => match state {
            AuthState::LoggedOut { .. } => AuthState::LoggedOut { error: None },
            other => other,
        },
    }
}

impl AuthState {
    pub fn user(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated { user } => Some(user),
            AuthState::Loading | AuthState::LoggedOut { .. } => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AuthState::LoggedOut { error } => error.as_deref(),
            AuthState::Loading | AuthState::Authenticated { .. } => None,
        }
    }

    /// Flat `{user, isLoading, error}` view for the frontend.
    pub fn view(&self) -> AuthView {
        AuthView {
            user: self.user().cloned(),
            is_loading: self.is_loading(),
            error: self.error().map(str::to_string),
        }
    }
}

/// Serializable snapshot of [`AuthState`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthView {
    pub user: Option<Identity>,
    pub is_loading: bool,
    pub error: Option<String>,
}
