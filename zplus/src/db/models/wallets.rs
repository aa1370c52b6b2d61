//! Database models for customer wallets and their transaction ledger.

use crate::types::{UserId, WalletTransactionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Wallet transaction kind, stored as TEXT
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionType {
    Deposit,
    Purchase,
}

/// Deposits start `pending` and move to `completed` once; purchases are born `completed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionStatus {
    Pending,
    Completed,
}

impl WalletTransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletTransactionStatus::Pending => "pending",
            WalletTransactionStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct WalletDBResponse {
    pub id: Uuid,
    pub user_id: UserId,
    pub balance: Decimal,
    pub total_deposited: Decimal,
    pub total_spent: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct WalletTransactionDBResponse {
    pub id: WalletTransactionId,
    pub user_id: UserId,
    pub transaction_type: WalletTransactionType,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub status: WalletTransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// Filter for a user's transaction history
#[derive(Debug, Clone)]
pub struct WalletTransactionFilter {
    pub user_id: UserId,
    pub transaction_type: Option<WalletTransactionType>,
    pub skip: i64,
    pub limit: i64,
}

impl WalletTransactionFilter {
    pub fn new(user_id: UserId, skip: i64, limit: i64) -> Self {
        Self {
            user_id,
            transaction_type: None,
            skip,
            limit,
        }
    }
}
