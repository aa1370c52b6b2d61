//! API response models for the admin dashboard.

use crate::db::models::dashboard::{ActivityDBResponse, DashboardCountsDBResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub users_count: i64,
    pub orders_count: i64,
    /// Sum of `final_amount` over paid orders
    pub revenue: Decimal,
    pub products_count: i64,
    pub blog_posts_count: i64,
    pub projects_count: i64,
}

impl From<DashboardCountsDBResponse> for DashboardStats {
    fn from(db: DashboardCountsDBResponse) -> Self {
        Self {
            users_count: db.users_count,
            orders_count: db.orders_count,
            revenue: db.revenue,
            products_count: db.products_count,
            blog_posts_count: db.blog_posts_count,
            projects_count: db.projects_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityItem {
    /// `order`, `user` or `blog_post`
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub user: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<ActivityDBResponse> for ActivityItem {
    fn from(db: ActivityDBResponse) -> Self {
        Self {
            kind: db.kind,
            description: db.description,
            user: db.actor,
            timestamp: db.occurred_at,
        }
    }
}
