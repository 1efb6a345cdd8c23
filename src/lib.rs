// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin Console: authenticated session layer for the admin dashboard
//!
//! This crate holds the client side of the dashboard's session: token
//! persistence, claims decoding, an HTTP client that refreshes expired
//! sessions behind a single in-flight refresh, the auth state machine and
//! the route guard.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{ApiClient, AuthSession, Navigator, TokenStore};
use std::sync::Arc;

/// Everything a dashboard front end needs, wired over one client.
pub struct Console {
    pub config: Config,
    pub client: Arc<ApiClient>,
    pub session: AuthSession,
    pub api: api::Api,
    pub routes: routes::RouteTable,
}

impl Console {
    pub fn new(
        config: Config,
        store: TokenStore,
        navigator: Arc<dyn Navigator>,
    ) -> error::Result<Self> {
        let client = Arc::new(ApiClient::new(&config, store, navigator)?);
        let session = AuthSession::start(client.clone());

        Ok(Self {
            api: api::Api::new(client.clone()),
            routes: routes::RouteTable::dashboard(),
            config,
            client,
            session,
        })
    }

    /// Guard a visit to `path` with the current session state.
    pub fn guard(&self, path: &str) -> routes::GuardDecision {
        self.routes
            .evaluate(&self.session.state(), path, &self.config.login_path)
    }
}
