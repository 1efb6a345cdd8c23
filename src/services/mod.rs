// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session plumbing behind the API wrappers.

pub mod auth;
pub mod auth_state;
pub mod client;
pub mod navigator;
pub mod session;
pub mod token_store;

pub use auth::AuthSession;
pub use auth_state::{reduce, AuthAction, AuthState, AuthView};
pub use client::{ApiClient, ApiRequest, SessionEvent};
pub use navigator::{MemoryNavigator, Navigator};
pub use token_store::{FileStorage, KeyValueStore, MemoryStorage, StorageError, TokenStore};
