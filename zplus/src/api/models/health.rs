//! Liveness report served at `/health`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// `connected` or `disconnected`
    pub database: String,
    /// `connected`, `disconnected` or `disabled`
    pub cache: String,
    pub version: String,
}
