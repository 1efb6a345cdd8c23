//! Dashboard widget data from `/v1/dashboard`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Headline counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub active_users: u64,
    pub new_users_this_month: u64,
    #[serde(default)]
    pub admin_count: u64,
    #[serde(default)]
    pub moderator_count: u64,
}

impl DashboardStats {
    /// Share of active users, 0.0 when there are none.
    pub fn active_ratio(&self) -> f64 {
        if self.total_users == 0 {
            0.0
        } else {
            self.active_users as f64 / self.total_users as f64
        }
    }
}

/// Daily sign-up count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub count: u64,
}

/// Audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub user_email: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything the landing page shows.
#[derive(Debug, Clone)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub growth: Vec<GrowthPoint>,
    pub activity: Vec<ActivityEntry>,
}
