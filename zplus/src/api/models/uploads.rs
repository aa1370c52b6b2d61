//! API response models for file uploads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Generated name on disk, `{uuid}{ext}`
    pub file_name: String,
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    /// Path the file is served from
    pub url: String,
    /// Hex SHA-256 of the content
    pub hash: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MultiUploadResponse {
    pub uploaded: Vec<UploadResponse>,
    pub count: usize,
    /// One `"{original name}: {reason}"` entry per rejected file
    pub errors: Vec<String>,
    pub error_count: usize,
}

impl MultiUploadResponse {
    pub fn new(uploaded: Vec<UploadResponse>, errors: Vec<String>) -> Self {
        Self {
            count: uploaded.len(),
            error_count: errors.len(),
            uploaded,
            errors,
        }
    }
}
