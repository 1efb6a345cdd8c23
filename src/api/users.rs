// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User management endpoints.

use crate::error::{ApiError, Result};
use crate::models::{
    CreateUserRequest, Paginated, StatusUpdate, UpdateUserRequest, User, UserQuery,
};
use crate::services::client::{ApiClient, ApiRequest};
use futures_util::future::join_all;
use serde::de::IgnoredAny;
use std::sync::Arc;
use validator::Validate;

pub const USERS_PATH: &str = "/v1/users";

fn user_path(id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::new(
            "User id is required",
            400,
            Some(ApiError::VALIDATION_ERROR),
        ));
    }
    Ok(format!("{}/{}", USERS_PATH, urlencoding::encode(id)))
}

/// CRUD over `/v1/users`.
#[derive(Clone)]
pub struct UsersApi {
    client: Arc<ApiClient>,
}

impl UsersApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &UserQuery) -> Result<Paginated<User>> {
        query.validate()?;
        self.client
            .fetch(ApiRequest::get(USERS_PATH).query_pairs(query.to_pairs()))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        self.client.fetch(ApiRequest::get(user_path(id)?)).await
    }

    pub async fn create(&self, request: &CreateUserRequest) -> Result<User> {
        request.validate()?;
        let user: User = self
            .client
            .fetch(ApiRequest::post(USERS_PATH).json(request)?)
            .await?;
        tracing::info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn update(&self, id: &str, request: &UpdateUserRequest) -> Result<User> {
        request.validate()?;
        self.client
            .fetch(ApiRequest::put(user_path(id)?).json(request)?)
            .await
    }

    /// Activate or deactivate a user.
    pub async fn set_active(&self, id: &str, is_active: bool) -> Result<User> {
        let path = format!("{}/status", user_path(id)?);
        self.client
            .fetch(ApiRequest::patch(path).json(&StatusUpdate { is_active })?)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .send::<IgnoredAny>(ApiRequest::delete(user_path(id)?))
            .await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Delete several users concurrently. Results are in input order.
    pub async fn delete_many(&self, ids: &[String]) -> Vec<(String, Result<()>)> {
        let results = join_all(ids.iter().map(|id| self.delete(id))).await;
        ids.iter().cloned().zip(results).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_path_encodes_id() {
        assert_eq!(user_path("42").unwrap(), "/v1/users/42");
        assert_eq!(user_path("a/b").unwrap(), "/v1/users/a%2Fb");
        assert_eq!(user_path("  ").unwrap_err().status, 400);
    }
}
