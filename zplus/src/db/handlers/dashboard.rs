//! Read-only aggregate queries behind the admin dashboard.

use crate::db::{
    errors::Result,
    models::dashboard::{ActivityDBResponse, DashboardCountsDBResponse},
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Dashboard<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Dashboard<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn counts(&mut self) -> Result<DashboardCountsDBResponse> {
        let counts = sqlx::query_as::<_, DashboardCountsDBResponse>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users_count,
                (SELECT COUNT(*) FROM orders) AS orders_count,
                (SELECT COUNT(*) FROM software_products) AS products_count,
                (SELECT COUNT(*) FROM blog_posts) AS blog_posts_count,
                (SELECT COUNT(*) FROM projects) AS projects_count,
                (SELECT COALESCE(SUM(final_amount), 0) FROM orders WHERE payment_status = 'paid') AS revenue
            "#,
        )
        .fetch_one(&mut *self.db)
        .await?;
        Ok(counts)
    }

    /// The most recent orders, registrations and posts, merged newest first
    #[instrument(skip(self), err)]
    pub async fn recent_activity(&mut self, limit: i64) -> Result<Vec<ActivityDBResponse>> {
        let activity = sqlx::query_as::<_, ActivityDBResponse>(
            r#"
            SELECT * FROM (
                (SELECT 'order' AS kind, 'New order #' || o.order_number || ' placed' AS description,
                        u.email AS actor, o.created_at AS occurred_at
                 FROM orders o LEFT JOIN users u ON u.id = o.user_id
                 ORDER BY o.created_at DESC LIMIT $1)
                UNION ALL
                (SELECT 'user', 'New user registered', u.email, u.created_at
                 FROM users u
                 ORDER BY u.created_at DESC LIMIT $1)
                UNION ALL
                (SELECT 'blog_post', 'Blog post "' || p.title || '" created', u.email, p.created_at
                 FROM blog_posts p LEFT JOIN users u ON u.id = p.author_id
                 ORDER BY p.created_at DESC LIMIT $1)
            ) activity
            ORDER BY occurred_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{orders::Orders, users::Users};
    use crate::db::models::orders::OrderCreateDBRequest;
    use crate::test_utils::create_test_user;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_counts_only_paid_revenue(pool: PgPool) {
        let user = create_test_user(&pool, "counter").await;
        let mut conn = pool.acquire().await.unwrap();

        let mut orders = Orders::new(&mut conn);
        let unpaid = orders
            .create(&OrderCreateDBRequest {
                user_id: user.id,
                lines: vec![],
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(unpaid.final_amount, Decimal::ZERO);

        let counts = Dashboard::new(&mut conn).counts().await.unwrap();
        assert_eq!(counts.users_count, 1);
        assert_eq!(counts.orders_count, 1);
        assert_eq!(counts.revenue, Decimal::ZERO);
        assert_eq!(counts.products_count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_recent_activity_is_merged_and_capped(pool: PgPool) {
        for i in 0..12 {
            create_test_user(&pool, &format!("member{i}")).await;
        }
        let mut conn = pool.acquire().await.unwrap();
        let buyer = Users::new(&mut conn).get_user_by_username("member11").await.unwrap().unwrap();
        Orders::new(&mut conn)
            .create(&OrderCreateDBRequest {
                user_id: buyer.id,
                lines: vec![],
                notes: None,
            })
            .await
            .unwrap();

        let activity = Dashboard::new(&mut conn).recent_activity(10).await.unwrap();
        assert_eq!(activity.len(), 10);
        assert_eq!(activity[0].kind, "order");
        assert!(activity[0].description.starts_with("New order #ORD-"));
        assert_eq!(activity[0].actor.as_deref(), Some(buyer.email.as_str()));
        assert!(activity.windows(2).all(|w| w[0].occurred_at >= w[1].occurred_at));
    }
}
