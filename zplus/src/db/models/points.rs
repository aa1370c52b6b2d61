//! Database models for loyalty points.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PointTransactionType {
    Earned,
    Used,
}

#[derive(Debug, Clone, FromRow)]
pub struct PointsDBResponse {
    pub id: Uuid,
    pub user_id: UserId,
    pub total_points: i64,
    pub available_points: i64,
    pub used_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PointTransactionDBResponse {
    pub id: Uuid,
    pub user_id: UserId,
    pub points: i64,
    pub transaction_type: PointTransactionType,
    pub reason: Option<String>,
    pub reference_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
