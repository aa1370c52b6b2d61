//! API request/response models for the wallet and loyalty points.

use crate::api::models::pagination::Pagination;
use crate::db::models::points::{PointTransactionDBResponse, PointTransactionType, PointsDBResponse};
use crate::db::models::wallets::{WalletDBResponse, WalletTransactionDBResponse, WalletTransactionStatus, WalletTransactionType};
use crate::errors::{Error, Result};
use crate::types::{UserId, WalletTransactionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Gateways a deposit can be paid through
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Vnpay,
    Momo,
    Zalopay,
    Banking,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Vnpay => "vnpay",
            PaymentMethod::Momo => "momo",
            PaymentMethod::Zalopay => "zalopay",
            PaymentMethod::Banking => "banking",
        }
    }

    /// Sandbox checkout link for a deposit. VNPay takes the amount in hundredths.
    pub fn payment_url(&self, reference_id: &str, amount: Decimal) -> String {
        let whole = amount.trunc();
        match self {
            PaymentMethod::Vnpay => format!(
                "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?vnp_Amount={}&vnp_TxnRef={reference_id}",
                (amount * Decimal::ONE_HUNDRED).trunc()
            ),
            PaymentMethod::Momo => format!("https://test-payment.momo.vn/pay?amount={whole}&orderInfo={reference_id}"),
            PaymentMethod::Zalopay => {
                format!("https://sbgateway.zalopay.vn/api/getlistmerchantbanks?amount={whole}&orderid={reference_id}")
            }
            PaymentMethod::Banking => format!("https://portal.vietcombank.com.vn/Personal/Login?amount={whole}&ref={reference_id}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub balance: Decimal,
    pub total_deposited: Decimal,
    pub total_spent: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<WalletDBResponse> for WalletResponse {
    fn from(db: WalletDBResponse) -> Self {
        Self {
            user_id: db.user_id,
            balance: db.balance,
            total_deposited: db.total_deposited,
            total_spent: db.total_spent,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletTransactionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: WalletTransactionId,
    pub transaction_type: WalletTransactionType,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub status: WalletTransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl From<WalletTransactionDBResponse> for WalletTransactionResponse {
    fn from(db: WalletTransactionDBResponse) -> Self {
        Self {
            id: db.id,
            transaction_type: db.transaction_type,
            amount: db.amount,
            balance_after: db.balance_after,
            description: db.description,
            reference_id: db.reference_id,
            status: db.status,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListWalletTransactionsQuery {
    /// Only return deposits or only purchases
    pub transaction_type: Option<WalletTransactionType>,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepositRequest {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
}

/// Largest amount a `NUMERIC(15, 2)` ledger column holds
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_7FFF, 0x0003_8D7E, 0, false, 2);

impl DepositRequest {
    pub fn validate(&self, min_deposit: u64) -> Result<()> {
        if self.amount < Decimal::from(min_deposit) {
            return Err(Error::BadRequest {
                message: format!("amount must be at least {min_deposit}"),
            });
        }
        if self.amount > MAX_AMOUNT {
            return Err(Error::BadRequest {
                message: format!("amount must be at most {MAX_AMOUNT}"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepositResponse {
    pub transaction: WalletTransactionResponse,
    pub payment_url: String,
    pub redirect_info: String,
}

/// Payment gateway notification for a pending deposit
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepositCallback {
    #[schema(value_type = String, format = "uuid")]
    pub transaction_id: WalletTransactionId,
    pub status: String,
    #[serde(default)]
    pub reference_id: String,
    #[serde(default)]
    pub signature: String,
}

impl DepositCallback {
    /// The string the gateway signs
    pub fn signing_payload(&self) -> String {
        format!("{}:{}:{}", self.transaction_id, self.status, self.reference_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PointsResponse {
    pub total_points: i64,
    pub available_points: i64,
    pub used_points: i64,
    pub updated_at: DateTime<Utc>,
    pub recent_transactions: Vec<PointTransactionResponse>,
}

impl PointsResponse {
    pub fn new(account: PointsDBResponse, recent: Vec<PointTransactionDBResponse>) -> Self {
        Self {
            total_points: account.total_points,
            available_points: account.available_points,
            used_points: account.used_points,
            updated_at: account.updated_at,
            recent_transactions: recent.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PointTransactionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub points: i64,
    pub transaction_type: PointTransactionType,
    pub reason: Option<String>,
    pub reference_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PointTransactionDBResponse> for PointTransactionResponse {
    fn from(db: PointTransactionDBResponse) -> Self {
        Self {
            id: db.id,
            points: db.points,
            transaction_type: db.transaction_type,
            reason: db.reason,
            reference_id: db.reference_id,
            expires_at: db.expires_at,
            created_at: db.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_deposit_amount_bounds() {
        assert_eq!(MAX_AMOUNT.to_string(), "9999999999999.99");

        let request = |amount: &str| DepositRequest {
            amount: Decimal::from_str(amount).unwrap(),
            payment_method: PaymentMethod::Banking,
        };
        assert!(request("1000").validate(1000).is_ok());
        assert!(request("9999999999999.99").validate(1000).is_ok());
        assert!(request("999").validate(1000).is_err());
        let err = request("10000000000000").validate(1000).unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
    }

    #[test]
    fn test_payment_urls() {
        let amount = Decimal::from_str("50000.00").unwrap();
        assert_eq!(
            PaymentMethod::Vnpay.payment_url("DEP_x_ABCDEFGH", amount),
            "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?vnp_Amount=5000000&vnp_TxnRef=DEP_x_ABCDEFGH"
        );
        assert_eq!(
            PaymentMethod::Momo.payment_url("DEP_x_ABCDEFGH", amount),
            "https://test-payment.momo.vn/pay?amount=50000&orderInfo=DEP_x_ABCDEFGH"
        );
    }

    #[test]
    fn test_unknown_payment_method_rejected() {
        let parsed = serde_json::from_str::<DepositRequest>(r#"{"amount": "1000", "payment_method": "paypal"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_minimum_deposit() {
        let request = DepositRequest {
            amount: Decimal::from(999),
            payment_method: PaymentMethod::Banking,
        };
        assert!(request.validate(1000).is_err());
        let request = DepositRequest {
            amount: Decimal::from(1000),
            ..request
        };
        assert!(request.validate(1000).is_ok());
    }
}
