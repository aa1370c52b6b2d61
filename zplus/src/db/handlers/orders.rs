//! Database repository for orders.

use crate::db::{
    errors::{DbError, Result},
    models::orders::{OrderCreateDBRequest, OrderDBResponse, OrderItemDBResponse, OrderStatus, PaymentStatus},
};
use crate::types::{OrderId, UserId, abbrev_uuid, random_alphanumeric};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Connection, PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub skip: i64,
    pub limit: i64,
    /// Restrict to one customer's orders
    pub user_id: Option<UserId>,
    pub order_status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            user_id: None,
            order_status: None,
        }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, sqlx::Postgres>) {
        if let Some(user_id) = self.user_id {
            query.push(" AND user_id = ");
            query.push_bind(user_id);
        }
        if let Some(status) = self.order_status {
            query.push(" AND order_status = ");
            query.push_bind(status);
        }
    }
}

/// `ORD-{YYYYMMDD}-{8 uppercase letters/digits}`
pub fn generate_order_number() -> String {
    format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), random_alphanumeric(8).to_uppercase())
}

pub struct Orders<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Orders<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Write the order header and its lines in one transaction.
    ///
    /// `total_amount` sums list prices, `final_amount` sums charged prices and `discount_amount`
    /// is the difference.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), lines = request.lines.len()), err)]
    pub async fn create(&mut self, request: &OrderCreateDBRequest) -> Result<OrderDBResponse> {
        let (total, payable) = request.lines.iter().fold((Decimal::ZERO, Decimal::ZERO), |(total, payable), line| {
            let quantity = Decimal::from(line.quantity);
            (total + line.list_price * quantity, payable + line.unit_price * quantity)
        });

        let mut tx = self.db.begin().await?;
        let order = sqlx::query_as::<_, OrderDBResponse>(
            r#"
            INSERT INTO orders (id, order_number, user_id, total_amount, discount_amount, final_amount, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(generate_order_number())
        .bind(request.user_id)
        .bind(total)
        .bind((total - payable).max(Decimal::ZERO))
        .bind(payable)
        .bind(&request.notes)
        .fetch_one(&mut *tx)
        .await?;

        for line in &request.lines {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, product_name, price, quantity) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: OrderId) -> Result<Option<OrderDBResponse>> {
        let order = sqlx::query_as::<_, OrderDBResponse>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(order)
    }

    /// Read an order and hold its row lock until the surrounding transaction ends
    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    pub async fn get_for_update(&mut self, id: OrderId) -> Result<Option<OrderDBResponse>> {
        let order = sqlx::query_as::<_, OrderDBResponse>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&order_id)), err)]
    pub async fn items(&mut self, order_id: OrderId) -> Result<Vec<OrderItemDBResponse>> {
        let items = sqlx::query_as::<_, OrderItemDBResponse>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at, product_name",
        )
        .bind(order_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(items)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &OrderFilter) -> Result<Vec<OrderDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM orders WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let orders = query.build_query_as::<OrderDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(orders)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &OrderFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE 1=1");
        filter.push_conditions(&mut query);
        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    /// Record a successful payment. Only an unpaid order can be marked; anything else is
    /// [`DbError::NotPending`].
    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    pub async fn mark_paid(&mut self, id: OrderId, payment_method: &str) -> Result<OrderDBResponse> {
        let paid = sqlx::query_as::<_, OrderDBResponse>(
            r#"
            UPDATE orders
            SET payment_status = $2, order_status = $3, payment_method = $4, updated_at = NOW()
            WHERE id = $1 AND payment_status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(PaymentStatus::Paid)
        .bind(OrderStatus::Processing)
        .bind(payment_method)
        .fetch_optional(&mut *self.db)
        .await?;

        match paid {
            Some(order) => Ok(order),
            None => match self.get_by_id(id).await? {
                Some(order) => Err(DbError::NotPending {
                    status: order.payment_status.as_str().to_string(),
                }),
                None => Err(DbError::NotFound),
            },
        }
    }

    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    pub async fn update_status(&mut self, id: OrderId, status: OrderStatus) -> Result<OrderDBResponse> {
        sqlx::query_as::<_, OrderDBResponse>("UPDATE orders SET order_status = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{products::Products, repository::Repository};
    use crate::db::models::{orders::OrderLine, products::ProductDBRequest};
    use crate::test_utils::create_test_user;
    use sqlx::PgPool;

    fn line(name: &str, list: i64, unit: i64, quantity: i32) -> OrderLine {
        OrderLine {
            product_id: Uuid::new_v4(),
            product_name: name.to_string(),
            list_price: Decimal::new(list, 0),
            unit_price: Decimal::new(unit, 0),
            quantity,
        }
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let parts: Vec<_> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    async fn order_with_lines(pool: &PgPool, name: &str) -> (UserId, OrderDBResponse) {
        let user = create_test_user(pool, name).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut products = Products::new(&mut conn);
        let mut lines = vec![line("Editor", 300_000, 250_000, 2), line("Backup", 100_000, 100_000, 1)];
        for line in &mut lines {
            let product = products
                .create(&ProductDBRequest {
                    name: line.product_name.clone(),
                    slug: format!("{}-{}", line.product_name.to_lowercase(), name),
                    description: "x".to_string(),
                    price: line.list_price,
                    is_active: true,
                    ..Default::default()
                })
                .await
                .unwrap();
            line.product_id = product.id;
        }

        let order = Orders::new(&mut conn)
            .create(&OrderCreateDBRequest {
                user_id: user.id,
                lines,
                notes: Some("please hurry".to_string()),
            })
            .await
            .unwrap();
        (user.id, order)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_computes_totals(pool: PgPool) {
        let (user_id, order) = order_with_lines(&pool, "shopper").await;

        assert_eq!(order.total_amount, Decimal::new(700_000, 0));
        assert_eq!(order.final_amount, Decimal::new(600_000, 0));
        assert_eq!(order.discount_amount, Decimal::new(100_000, 0));
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.user_id, Some(user_id));

        let mut conn = pool.acquire().await.unwrap();
        let items = Orders::new(&mut conn).items(order.id).await.unwrap();
        assert_eq!(items.len(), 2);
        let editor = items.iter().find(|i| i.product_name == "Editor").unwrap();
        assert_eq!(editor.price, Decimal::new(250_000, 0));
        assert_eq!(editor.quantity, 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_mark_paid_only_once(pool: PgPool) {
        let (_, order) = order_with_lines(&pool, "payer").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Orders::new(&mut conn);

        let paid = repo.mark_paid(order.id, "wallet").await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.order_status, OrderStatus::Processing);
        assert_eq!(paid.payment_method.as_deref(), Some("wallet"));

        assert!(matches!(repo.mark_paid(order.id, "wallet").await, Err(DbError::NotPending { .. })));
        assert!(matches!(repo.mark_paid(Uuid::new_v4(), "wallet").await, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_by_user_and_status(pool: PgPool) {
        let (alice, first) = order_with_lines(&pool, "alice").await;
        order_with_lines(&pool, "bob").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Orders::new(&mut conn);

        assert_eq!(repo.count(&OrderFilter::new(0, 10)).await.unwrap(), 2);
        let mine = repo.list(&OrderFilter::new(0, 10).for_user(alice)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, first.id);

        repo.update_status(first.id, OrderStatus::Cancelled).await.unwrap();
        let cancelled = OrderFilter {
            order_status: Some(OrderStatus::Cancelled),
            ..OrderFilter::new(0, 10)
        };
        assert_eq!(repo.count(&cancelled).await.unwrap(), 1);
        assert!(matches!(
            repo.update_status(Uuid::new_v4(), OrderStatus::Completed).await,
            Err(DbError::NotFound)
        ));
    }
}
