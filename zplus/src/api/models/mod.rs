//! API request and response data models.
//!
//! These structures are the public contract of the HTTP API. They are kept apart from the
//! database models so storage can change without breaking clients, and every one of them is
//! annotated with `utoipa` for the generated OpenAPI document. Conversions from database rows live
//! next to the response types as `From` impls.
//!
//! Request types that need checking beyond deserialization expose a `validate()` returning a
//! `VALIDATION_ERROR`.
//!
//! - [`envelope`] and [`pagination`]: the response wrapper and page metadata shared by every route
//! - [`auth`], [`users`]: accounts and credentials
//! - [`blog`], [`projects`], [`products`]: published content
//! - [`orders`], [`wallet`]: commerce and the ledger
//! - [`uploads`], [`wordpress`], [`graphql`], [`admin`], [`health`]

pub mod admin;
pub mod auth;
pub mod blog;
pub mod envelope;
pub mod graphql;
pub mod health;
pub mod orders;
pub mod pagination;
pub mod products;
pub mod projects;
pub mod uploads;
pub mod users;
pub mod validation;
pub mod wallet;
pub mod wordpress;
