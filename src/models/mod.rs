// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the admin API.

pub mod auth;
pub mod dashboard;
pub mod envelope;
pub mod identity;
pub mod user;

pub use auth::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse};
pub use dashboard::{ActivityEntry, DashboardOverview, DashboardStats, GrowthPoint};
pub use envelope::{Envelope, Paginated};
pub use identity::{Claims, Identity, Permission, Role};
pub use user::{CreateUserRequest, StatusUpdate, UpdateUserRequest, User, UserQuery};
