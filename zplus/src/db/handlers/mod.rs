//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` (a pooled connection or an open transaction) and
//! returns records from [`crate::db::models`]. Content tables with the usual create/read/list/
//! update/delete surface implement [`Repository`]; ledgers, orders and the sync log expose
//! purpose-built methods instead, since their rows are never edited freely.
//!
//! # Available Repositories
//!
//! - [`Users`], [`Sessions`], [`PasswordResets`]: accounts and credentials
//! - [`Wallets`], [`Points`]: the wallet and loyalty-points ledgers
//! - [`BlogPosts`], [`BlogCategories`]: blog content
//! - [`Projects`]: portfolio projects
//! - [`Products`], [`ProductCategories`]: the software catalog
//! - [`Orders`]: orders and their line items
//! - [`WordPressSites`], [`SyncLogs`]: remote sites and the sync log
//! - [`Dashboard`]: admin aggregates

pub mod blog_categories;
pub mod blog_posts;
pub mod dashboard;
pub mod orders;
pub mod password_resets;
pub mod points;
pub mod product_categories;
pub mod products;
pub mod projects;
pub mod repository;
pub mod sessions;
pub mod sync_logs;
pub mod users;
pub mod wallets;
pub mod wordpress_sites;

pub use blog_categories::BlogCategories;
pub use blog_posts::BlogPosts;
pub use dashboard::Dashboard;
pub use orders::Orders;
pub use password_resets::PasswordResets;
pub use points::Points;
pub use product_categories::ProductCategories;
pub use products::Products;
pub use projects::Projects;
pub use repository::Repository;
pub use sessions::Sessions;
pub use sync_logs::SyncLogs;
pub use users::Users;
pub use wallets::Wallets;
pub use wordpress_sites::WordPressSites;
