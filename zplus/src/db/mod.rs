//! Persistence layer: PostgreSQL through sqlx.
//!
//! ```text
//! api::handlers  ->  db::handlers (repositories)  ->  db::models  ->  PostgreSQL
//! ```
//!
//! - [`handlers`]: one repository struct per table family, each borrowing a `&mut PgConnection`
//! - [`models`]: request/response records exchanged with repositories
//! - [`errors`]: [`errors::DbError`], which classifies constraint violations and ledger failures
//!
//! Repositories accept either a pooled connection or an open transaction. Methods that must be
//! atomic (ledger mutations, order creation, blog posts with their category links) open a nested
//! transaction on whatever connection they were handed, so callers can also compose several
//! repository calls inside one outer transaction:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let charge = Wallets::new(&mut tx).charge(user_id, amount, "wallet", Some(&order_number)).await?;
//! Orders::new(&mut tx).mark_paid(order_id, "wallet").await?;
//! tx.commit().await?;
//! ```
//!
//! Migrations live in `migrations/` and are applied at startup via [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
