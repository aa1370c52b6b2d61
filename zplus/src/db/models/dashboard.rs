//! Aggregates for the admin dashboard.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct DashboardCountsDBResponse {
    pub users_count: i64,
    pub orders_count: i64,
    pub products_count: i64,
    pub blog_posts_count: i64,
    pub projects_count: i64,
    /// Sum of `final_amount` over paid orders
    pub revenue: Decimal,
}

/// One entry of the merged activity feed
#[derive(Debug, Clone, FromRow)]
pub struct ActivityDBResponse {
    pub kind: String,
    pub description: String,
    pub actor: Option<String>,
    pub occurred_at: DateTime<Utc>,
}
