// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed wrappers for the backend REST endpoints.

pub mod auth;
pub mod dashboard;
pub mod users;

pub use auth::AuthApi;
pub use dashboard::DashboardApi;
pub use users::UsersApi;

use crate::services::client::ApiClient;
use std::sync::Arc;

/// All endpoint groups over one shared client.
#[derive(Clone)]
pub struct Api {
    pub auth: AuthApi,
    pub users: UsersApi,
    pub dashboard: DashboardApi,
}

impl Api {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            auth: AuthApi::new(client.clone()),
            users: UsersApi::new(client.clone()),
            dashboard: DashboardApi::new(client),
        }
    }
}
