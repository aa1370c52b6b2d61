//! HTTP request handlers for all API endpoints.
//!
//! Handlers are grouped by resource. Each one validates its input, checks the caller through the
//! [`crate::auth::current_user`] extractors, runs the work through the repositories in
//! [`crate::db::handlers`] and wraps the result in the [`ApiResponse`] envelope.
//!
//! # Handler Modules
//!
//! - [`auth`]: registration, login, logout, profile and password flows
//! - [`admin`]: admin sign-in, dashboard statistics and user management
//! - [`blog`], [`projects`], [`products`]: public content and its admin maintenance
//! - [`orders`], [`wallet`]: checkout, the wallet ledger, deposits and loyalty points
//! - [`uploads`]: multipart uploads and serving stored files
//! - [`wordpress`]: connected WordPress sites, sync and the inbound webhook
//! - [`graphql`]: the small user-directory GraphQL endpoint
//! - [`health`]: liveness with database and cache status
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which renders as the failure envelope with the
//! matching status code and error code.
//!
//! [`ApiResponse`]: crate::api::models::envelope::ApiResponse

pub mod admin;
pub mod auth;
pub mod blog;
pub mod graphql;
pub mod health;
pub mod orders;
pub mod products;
pub mod projects;
pub mod uploads;
pub mod wallet;
pub mod wordpress;
