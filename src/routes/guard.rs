// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guard: decides whether a protected view may render.

use crate::models::{Permission, Role};
use crate::services::auth_state::AuthState;

/// Query parameter carrying the location to return to after login.
pub const RETURN_PARAM: &str = "from";

/// What a route needs from the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requirement {
    pub role: Option<Role>,
    pub permission: Option<Permission>,
}

impl Requirement {
    /// Any signed-in user.
    pub const AUTHENTICATED: Requirement = Requirement {
        role: None,
        permission: None,
    };

    pub const fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            permission: None,
        }
    }

    pub const fn permission(permission: Permission) -> Self {
        Self {
            role: None,
            permission: Some(permission),
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session state not settled yet; show a neutral loading indicator.
    Loading,
    Allow,
    /// Not signed in. `location` is the login path with the attempted
    /// location preserved for the post-login return.
    RedirectToLogin { location: String },
    AccessDenied { reason: String },
}

/// Check `requirement` against `state` for a visit to `attempted`.
pub fn evaluate(
    state: &AuthState,
    requirement: &Requirement,
    attempted: &str,
    login_path: &str,
) -> GuardDecision {
    let user = match state {
        AuthState::Loading => return GuardDecision::Loading,
        AuthState::LoggedOut { .. } => {
            return GuardDecision::RedirectToLogin {
                location: login_location(login_path, attempted),
            }
        }
        AuthState::Authenticated { user } => user,
    };

    if let Some(role) = requirement.role {
        if user.role != role {
            tracing::debug!(required = %role, actual = %user.role, path = attempted, "Access denied by role");
            return GuardDecision::AccessDenied {
                reason: format!("This page requires the {} role.", role),
            };
        }
    }

    if let Some(permission) = requirement.permission {
        if !user.role.grants(permission) {
            tracing::debug!(required = %permission, role = %user.role, path = attempted, "Access denied by permission");
            return GuardDecision::AccessDenied {
                reason: format!("You do not have the {} permission.", permission),
            };
        }
    }

    GuardDecision::Allow
}

/// Login path with the attempted location attached.
pub fn login_location(login_path: &str, attempted: &str) -> String {
    if attempted.is_empty() || attempted == "/" {
        return login_path.to_string();
    }
    format!(
        "{}?{}={}",
        login_path,
        RETURN_PARAM,
        urlencoding::encode(attempted)
    )
}

/// Where to go after login, read back from a login location's query.
///
/// Only same-site paths are honoured.
pub fn return_target(location: &str) -> Option<String> {
    let (_, query) = location.split_once('?')?;
    let raw = query.split('&').find_map(|pair| {
        pair.strip_prefix(RETURN_PARAM)
            .and_then(|rest| rest.strip_prefix('='))
    })?;
    let decoded = urlencoding::decode(raw).ok()?.into_owned();

    // Browsers treat a leading "/\" like "//".
    let offsite = decoded.starts_with("//") || decoded.starts_with("/\\");
    (decoded.starts_with('/') && !offsite).then_some(decoded)
}
