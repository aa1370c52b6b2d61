//! Payment gateway plumbing shared by the wallet endpoints.
//!
//! Gateways report deposit outcomes through a callback. When `payments.callback_secret` is set
//! each callback must carry a signature produced by [`signing::sign_callback`].

pub mod signing;
