//! Database repository for customer wallets.
//!
//! Every balance change happens inside a transaction that also writes exactly one
//! `wallet_transactions` row, and `balance_after` on that row is the balance the change produced.
//! Two guards keep concurrent callers honest without row locks held across round trips:
//!
//! - charges decrement with `WHERE balance >= amount`, so two racing charges cannot overdraw;
//! - deposit completion flips `pending -> completed` with `WHERE status = 'pending'`, so a
//!   replayed callback credits the wallet at most once.

use crate::db::{
    errors::{DbError, Result},
    models::wallets::{
        WalletDBResponse, WalletTransactionDBResponse, WalletTransactionFilter, WalletTransactionStatus, WalletTransactionType,
    },
};
use crate::types::{UserId, WalletTransactionId, abbrev_uuid, random_alphanumeric};
use rust_decimal::Decimal;
use sqlx::{Connection, PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

pub struct Wallets<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Wallets<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fetch the user's wallet, creating an empty one on first access
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_or_create(&mut self, user_id: UserId) -> Result<WalletDBResponse> {
        Self::ensure_wallet(&mut *self.db, user_id).await
    }

    async fn ensure_wallet(conn: &mut PgConnection, user_id: UserId) -> Result<WalletDBResponse> {
        sqlx::query(
            "INSERT INTO customer_wallets (id, user_id) VALUES ($1, $2) ON CONFLICT ON CONSTRAINT customer_wallets_user_unique DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        let wallet = sqlx::query_as::<_, WalletDBResponse>("SELECT * FROM customer_wallets WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(wallet)
    }

    /// Open a pending deposit. The wallet itself is not touched until the payment is confirmed,
    /// so `balance_after` records the balance the deposit started from.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), %amount), err)]
    pub async fn create_deposit(&mut self, user_id: UserId, amount: Decimal, method: &str) -> Result<WalletTransactionDBResponse> {
        let mut tx = self.db.begin().await?;
        let wallet = Self::ensure_wallet(&mut tx, user_id).await?;

        let transaction = sqlx::query_as::<_, WalletTransactionDBResponse>(
            r#"
            INSERT INTO wallet_transactions (id, user_id, transaction_type, amount, balance_after, description, reference_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(WalletTransactionType::Deposit)
        .bind(amount)
        .bind(wallet.balance)
        .bind(format!("Wallet deposit via {method}"))
        .bind(format!("DEP_{}_{}", user_id, random_alphanumeric(8)))
        .bind(WalletTransactionStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(transaction)
    }

    /// Confirm a pending deposit and credit the wallet.
    ///
    /// Fails with [`DbError::NotFound`] for an unknown id and [`DbError::NotPending`] when the
    /// transaction has already left `pending`.
    #[instrument(skip(self), fields(transaction_id = %abbrev_uuid(&transaction_id)), err)]
    pub async fn complete_deposit(&mut self, transaction_id: WalletTransactionId) -> Result<WalletTransactionDBResponse> {
        let mut tx = self.db.begin().await?;

        let claimed = sqlx::query_as::<_, WalletTransactionDBResponse>(
            r#"
            UPDATE wallet_transactions SET status = 'completed'
            WHERE id = $1 AND status = 'pending' AND transaction_type = 'deposit'
            RETURNING *
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(pending) = claimed else {
            let status: Option<WalletTransactionStatus> =
                sqlx::query_scalar("SELECT status FROM wallet_transactions WHERE id = $1")
                    .bind(transaction_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match status {
                None => DbError::NotFound,
                Some(status) => DbError::NotPending {
                    status: status.as_str().to_string(),
                },
            });
        };

        Self::ensure_wallet(&mut tx, pending.user_id).await?;
        let balance: Decimal = sqlx::query_scalar(
            r#"
            UPDATE customer_wallets
            SET balance = balance + $2, total_deposited = total_deposited + $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING balance
            "#,
        )
        .bind(pending.user_id)
        .bind(pending.amount)
        .fetch_one(&mut *tx)
        .await?;

        let completed = sqlx::query_as::<_, WalletTransactionDBResponse>(
            "UPDATE wallet_transactions SET balance_after = $2 WHERE id = $1 RETURNING *",
        )
        .bind(transaction_id)
        .bind(balance)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(completed)
    }

    /// Debit the wallet for a purchase.
    ///
    /// The reference is `ORDER_{order_number}` when an order is given, otherwise a random
    /// `PAY_{user}_{suffix}`. Fails with [`DbError::InsufficientFunds`] and leaves the wallet
    /// untouched when the balance does not cover `amount`.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), %amount), err)]
    pub async fn charge(
        &mut self,
        user_id: UserId,
        amount: Decimal,
        method: &str,
        order_number: Option<&str>,
    ) -> Result<WalletTransactionDBResponse> {
        let mut tx = self.db.begin().await?;
        Self::ensure_wallet(&mut tx, user_id).await?;

        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            UPDATE customer_wallets
            SET balance = balance - $2, total_spent = total_spent + $2, updated_at = NOW()
            WHERE user_id = $1 AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(balance) = balance else {
            let current: Decimal = sqlx::query_scalar("SELECT balance FROM customer_wallets WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
            return Err(DbError::InsufficientFunds {
                balance: current,
                required: amount,
            });
        };

        let reference_id = match order_number {
            Some(order) => format!("ORDER_{order}"),
            None => format!("PAY_{}_{}", user_id, random_alphanumeric(8)),
        };

        let transaction = sqlx::query_as::<_, WalletTransactionDBResponse>(
            r#"
            INSERT INTO wallet_transactions (id, user_id, transaction_type, amount, balance_after, description, reference_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(WalletTransactionType::Purchase)
        .bind(amount)
        .bind(balance)
        .bind(format!("Payment via {method}"))
        .bind(reference_id)
        .bind(WalletTransactionStatus::Completed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(transaction)
    }

    #[instrument(skip(self), fields(transaction_id = %abbrev_uuid(&id)), err)]
    pub async fn get_transaction(&mut self, id: WalletTransactionId) -> Result<Option<WalletTransactionDBResponse>> {
        let transaction = sqlx::query_as::<_, WalletTransactionDBResponse>("SELECT * FROM wallet_transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(transaction)
    }

    fn push_filter(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &WalletTransactionFilter) {
        query.push(" WHERE user_id = ");
        query.push_bind(filter.user_id);
        if let Some(transaction_type) = filter.transaction_type {
            query.push(" AND transaction_type = ");
            query.push_bind(transaction_type);
        }
    }

    /// A user's transactions, newest first
    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id), limit = filter.limit, skip = filter.skip), err)]
    pub async fn list_transactions(&mut self, filter: &WalletTransactionFilter) -> Result<Vec<WalletTransactionDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM wallet_transactions");
        Self::push_filter(&mut query, filter);
        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let transactions = query
            .build_query_as::<WalletTransactionDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;
        Ok(transactions)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count_transactions(&mut self, filter: &WalletTransactionFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM wallet_transactions");
        Self::push_filter(&mut query, filter);
        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_user;
    use sqlx::PgPool;

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    async fn funded_wallet(pool: &PgPool, name: &str, amount: i64) -> UserId {
        let user = create_test_user(pool, name).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Wallets::new(&mut conn);
        let deposit = repo.create_deposit(user.id, dec(amount), "vnpay").await.unwrap();
        repo.complete_deposit(deposit.id).await.unwrap();
        user.id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_wallet_created_lazily(pool: PgPool) {
        let user = create_test_user(&pool, "lazy").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Wallets::new(&mut conn);

        let first = repo.get_or_create(user.id).await.unwrap();
        let second = repo.get_or_create(user.id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.balance, Decimal::ZERO);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_pending_deposit_does_not_move_balance(pool: PgPool) {
        let user = create_test_user(&pool, "depositor").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Wallets::new(&mut conn);

        let deposit = repo.create_deposit(user.id, dec(50_000), "momo").await.unwrap();
        assert_eq!(deposit.status, WalletTransactionStatus::Pending);
        assert_eq!(deposit.transaction_type, WalletTransactionType::Deposit);
        assert_eq!(deposit.balance_after, Decimal::ZERO);
        assert_eq!(deposit.description.as_deref(), Some("Wallet deposit via momo"));
        let reference = deposit.reference_id.unwrap();
        assert!(reference.starts_with(&format!("DEP_{}_", user.id)));
        assert_eq!(reference.len(), format!("DEP_{}_", user.id).len() + 8);

        assert_eq!(repo.get_or_create(user.id).await.unwrap().balance, Decimal::ZERO);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_complete_deposit_twice_credits_once(pool: PgPool) {
        let user = create_test_user(&pool, "twice").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Wallets::new(&mut conn);

        let deposit = repo.create_deposit(user.id, dec(100_000), "vnpay").await.unwrap();
        let completed = repo.complete_deposit(deposit.id).await.unwrap();
        assert_eq!(completed.status, WalletTransactionStatus::Completed);
        assert_eq!(completed.balance_after, dec(100_000));

        let second = repo.complete_deposit(deposit.id).await;
        assert!(matches!(second, Err(DbError::NotPending { .. })));

        let wallet = repo.get_or_create(user.id).await.unwrap();
        assert_eq!(wallet.balance, dec(100_000));
        assert_eq!(wallet.total_deposited, dec(100_000));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_complete_unknown_deposit(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let result = Wallets::new(&mut conn).complete_deposit(Uuid::new_v4()).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_charge_records_purchase(pool: PgPool) {
        let user_id = funded_wallet(&pool, "buyer", 10_000).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Wallets::new(&mut conn);

        let charge = repo.charge(user_id, dec(3_000), "wallet", Some("ORD-20250101-ABCDEFGH")).await.unwrap();
        assert_eq!(charge.transaction_type, WalletTransactionType::Purchase);
        assert_eq!(charge.status, WalletTransactionStatus::Completed);
        assert_eq!(charge.balance_after, dec(7_000));
        assert_eq!(charge.reference_id.as_deref(), Some("ORDER_ORD-20250101-ABCDEFGH"));
        assert_eq!(charge.description.as_deref(), Some("Payment via wallet"));

        let wallet = repo.get_or_create(user_id).await.unwrap();
        assert_eq!(wallet.balance, dec(7_000));
        assert_eq!(wallet.total_spent, dec(3_000));

        let adhoc = repo.charge(user_id, dec(1_000), "wallet", None).await.unwrap();
        assert!(adhoc.reference_id.unwrap().starts_with(&format!("PAY_{user_id}_")));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_charge_over_balance_leaves_wallet_unchanged(pool: PgPool) {
        let user_id = funded_wallet(&pool, "broke", 5_000).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Wallets::new(&mut conn);

        let result = repo.charge(user_id, dec(5_001), "wallet", None).await;
        match result {
            Err(DbError::InsufficientFunds { balance, required }) => {
                assert_eq!(balance, dec(5_000));
                assert_eq!(required, dec(5_001));
            }
            other => panic!("expected insufficient funds, got {other:?}"),
        }

        let wallet = repo.get_or_create(user_id).await.unwrap();
        assert_eq!(wallet.balance, dec(5_000));
        assert_eq!(wallet.total_spent, Decimal::ZERO);

        let history = repo
            .count_transactions(&WalletTransactionFilter::new(user_id, 0, 20))
            .await
            .unwrap();
        assert_eq!(history, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_charges_cannot_overdraw(pool: PgPool) {
        let user_id = funded_wallet(&pool, "racer", 1_000).await;

        let mut handles = Vec::new();
        for _ in 0..5 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let mut conn = pool.acquire().await.unwrap();
                Wallets::new(&mut conn).charge(user_id, dec(400), "wallet", None).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 2);

        let mut conn = pool.acquire().await.unwrap();
        let wallet = Wallets::new(&mut conn).get_or_create(user_id).await.unwrap();
        assert_eq!(wallet.balance, dec(200));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_history_filter_and_order(pool: PgPool) {
        let user_id = funded_wallet(&pool, "history", 10_000).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Wallets::new(&mut conn);
        repo.charge(user_id, dec(100), "wallet", None).await.unwrap();
        repo.charge(user_id, dec(200), "wallet", None).await.unwrap();

        let all = repo
            .list_transactions(&WalletTransactionFilter::new(user_id, 0, 20))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].amount, dec(200));

        let mut deposits = WalletTransactionFilter::new(user_id, 0, 20);
        deposits.transaction_type = Some(WalletTransactionType::Deposit);
        assert_eq!(repo.count_transactions(&deposits).await.unwrap(), 1);
    }
}
