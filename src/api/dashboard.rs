// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Analytics endpoints backing the dashboard widgets.

use crate::error::{ApiError, Result};
use crate::models::{ActivityEntry, DashboardOverview, DashboardStats, GrowthPoint};
use crate::services::client::{ApiClient, ApiRequest};
use std::sync::Arc;

const STATS_PATH: &str = "/v1/dashboard/stats";
const GROWTH_PATH: &str = "/v1/dashboard/growth";
const ACTIVITY_PATH: &str = "/v1/dashboard/activity";

/// Growth window shown on the landing page.
pub const OVERVIEW_GROWTH_DAYS: u32 = 30;
/// Activity entries shown on the landing page.
pub const OVERVIEW_ACTIVITY_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct DashboardApi {
    client: Arc<ApiClient>,
}

impl DashboardApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        self.client.fetch(ApiRequest::get(STATS_PATH)).await
    }

    /// Daily sign-ups over the last `days` days (1..=365).
    pub async fn user_growth(&self, days: u32) -> Result<Vec<GrowthPoint>> {
        if !(1..=365).contains(&days) {
            return Err(ApiError::new(
                "Days must be between 1 and 365",
                400,
                Some(ApiError::VALIDATION_ERROR),
            ));
        }
        self.client
            .fetch(ApiRequest::get(GROWTH_PATH).query("days", days))
            .await
    }

    /// Most recent audit entries (1..=100).
    pub async fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityEntry>> {
        if !(1..=100).contains(&limit) {
            return Err(ApiError::new(
                "Limit must be between 1 and 100",
                400,
                Some(ApiError::VALIDATION_ERROR),
            ));
        }
        self.client
            .fetch(ApiRequest::get(ACTIVITY_PATH).query("limit", limit))
            .await
    }

    /// Fetch every landing-page widget concurrently.
    pub async fn overview(&self) -> Result<DashboardOverview> {
        let (stats, growth, activity) = tokio::try_join!(
            self.stats(),
            self.user_growth(OVERVIEW_GROWTH_DAYS),
            self.recent_activity(OVERVIEW_ACTIVITY_LIMIT),
        )?;

        Ok(DashboardOverview {
            stats,
            growth,
            activity,
        })
    }
}
