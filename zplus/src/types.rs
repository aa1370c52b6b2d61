//! Common type definitions shared across the crate.
//!
//! # ID Types
//!
//! All entity IDs are UUIDs generated by the application, wrapped in type aliases so that
//! signatures say which table they point at:
//!
//! - [`UserId`]: User account identifier
//! - [`PostId`] / [`CategoryId`]: Blog content identifiers
//! - [`ProjectId`], [`ProductId`], [`ProductCategoryId`]: Catalog identifiers
//! - [`OrderId`]: Order identifier
//! - [`WalletTransactionId`]: Ledger entry identifier
//! - [`SiteId`]: WordPress site identifier
//!
//! Remote WordPress posts keep their own integer ids ([`RemotePostId`]).
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging
//! - [`random_alphanumeric`]: Random suffixes for reference ids and order numbers

use rand::distr::Alphanumeric;
use rand::prelude::RngExt;
use rand::rng;
use uuid::Uuid;

pub type UserId = Uuid;
pub type SessionId = Uuid;
pub type PostId = Uuid;
pub type CategoryId = Uuid;
pub type ProjectId = Uuid;
pub type ProductId = Uuid;
pub type ProductCategoryId = Uuid;
pub type OrderId = Uuid;
pub type WalletTransactionId = Uuid;
pub type SiteId = Uuid;
pub type RemotePostId = i64;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Generate `len` random ASCII letters and digits.
pub fn random_alphanumeric(len: usize) -> String {
    rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}
