//! Authentication and authorization.
//!
//! Accounts sign in with email and password and receive an HS256 JWT carrying their id, email,
//! username and role. Every protected route reads that token from the `Authorization: Bearer`
//! header; there are no cookies and no server-side session lookups on the request path. Issued
//! tokens are also recorded in `user_sessions` so logout can remove them.
//!
//! - [`current_user`]: the [`CurrentUser`](crate::api::models::users::CurrentUser) and
//!   [`AdminUser`](current_user::AdminUser) extractors
//! - [`password`]: Argon2 password hashing and reset-token helpers
//! - [`session`]: JWT signing and verification

pub mod current_user;
pub mod password;
pub mod session;
