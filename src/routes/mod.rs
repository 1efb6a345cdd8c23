// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard routes and what each one requires.

pub mod guard;

pub use guard::{evaluate, login_location, return_target, GuardDecision, Requirement};

use crate::models::{Permission, Role};
use crate::services::auth_state::AuthState;

/// Pattern segment matching any single path segment.
const PARAM_SEGMENT: &str = "{id}";

#[derive(Debug, Clone)]
struct Route {
    pattern: &'static str,
    requirement: Option<Requirement>,
}

/// Route patterns and their requirements.
///
/// A path resolves to the matching pattern with the most segments; literal
/// segments beat `{id}`. Paths matching nothing require a signed-in user.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The admin dashboard's routes.
    pub fn dashboard() -> Self {
        Self::new()
            .public("/login")
            .public("/register")
            .route("/dashboard", Requirement::AUTHENTICATED)
            .route("/users", Requirement::role(Role::Admin))
            .route("/users/{id}", Requirement::permission(Permission::Read))
            .route("/settings", Requirement::AUTHENTICATED)
            .route("/moderation", Requirement::permission(Permission::Moderate))
    }

    pub fn route(mut self, pattern: &'static str, requirement: Requirement) -> Self {
        self.routes.push(Route {
            pattern,
            requirement: Some(requirement),
        });
        self
    }

    /// Reachable without a session.
    pub fn public(mut self, pattern: &'static str) -> Self {
        self.routes.push(Route {
            pattern,
            requirement: None,
        });
        self
    }

    /// Requirement for `path`; `None` when the path is public.
    pub fn requirement(&self, path: &str) -> Option<Requirement> {
        let path = segments(strip_query(path));

        self.routes
            .iter()
            .filter_map(|route| specificity(route.pattern, &path).map(|rank| (rank, route)))
            .max_by_key(|(rank, _)| *rank)
            .map_or(Some(Requirement::AUTHENTICATED), |(_, route)| route.requirement)
    }

    /// Guard a visit to `path`.
    pub fn evaluate(&self, state: &AuthState, path: &str, login_path: &str) -> GuardDecision {
        match self.requirement(path) {
            Some(requirement) => guard::evaluate(state, &requirement, path, login_path),
            None => GuardDecision::Allow,
        }
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// `(segments, literal segments)` if `pattern` is a prefix of `path`.
fn specificity(pattern: &str, path: &[&str]) -> Option<(usize, usize)> {
    let pattern = segments(pattern);
    if pattern.len() > path.len() {
        return None;
    }

    let mut literals = 0;
    for (want, got) in pattern.iter().zip(path) {
        if *want == PARAM_SEGMENT {
            continue;
        }
        if want != got {
            return None;
        }
        literals += 1;
    }

    Some((pattern.len(), literals))
}
