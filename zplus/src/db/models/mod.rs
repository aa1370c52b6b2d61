//! Database record models.
//!
//! `*DBRequest` structs carry the columns a repository writes; `*DBResponse` structs derive
//! `sqlx::FromRow` and mirror what it reads back. API-facing shapes live in
//! [`crate::api::models`] and convert from these, so columns such as password hashes and site
//! application passwords stay inside this layer.

pub mod blog;
pub mod dashboard;
pub mod orders;
pub mod password_reset_tokens;
pub mod points;
pub mod products;
pub mod projects;
pub mod sessions;
pub mod users;
pub mod wallets;
pub mod wordpress;
