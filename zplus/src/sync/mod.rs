//! Synchronization with external content systems.
//!
//! - [`wordpress`]: pull and push of blog posts against the WordPress REST API

pub mod wordpress;
