//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/api/v1/auth/*`): registration, sessions, profile and password reset
//! - **Content** (`/api/v1/blog/*`, `/api/v1/projects/*`, `/api/v1/products/*`): public reads
//! - **Commerce** (`/api/v1/orders/*`, `/api/v1/wallet/*`): orders, the wallet and points
//! - **Uploads** (`/api/v1/upload/*`, served back from `/uploads/*`)
//! - **Admin** (`/api/v1/admin/*`): dashboard, users, content, orders and WordPress sites
//! - **GraphQL** (`/graphql`) and **health** (`/health`)
//!
//! # OpenAPI Documentation
//!
//! Endpoints are annotated with `utoipa`. The document is served at `/api-docs/openapi.json` and
//! rendered with Scalar at `/docs`.

pub mod handlers;
pub mod models;
