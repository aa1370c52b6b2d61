//! On-disk storage for uploaded files.
//!
//! Uploads are streamed chunk by chunk into `{dir}/{category}/{uuid}{ext}` while a SHA-256 digest
//! is computed over the same bytes. A file that breaks a rule part-way through is removed again, so
//! the directory only ever holds complete uploads.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartError};
use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::api::models::uploads::UploadResponse;

/// Extensions accepted by the image endpoint
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];

/// Extensions refused by the generic file endpoints
pub const BLOCKED_EXTENSIONS: &[&str] = &[".exe", ".bat", ".cmd", ".sh", ".php", ".jsp", ".asp", ".js", ".vbs", ".scr"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    Images,
    Files,
    Products,
}

impl UploadCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadCategory::Images => "images",
            UploadCategory::Files => "files",
            UploadCategory::Products => "products",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "images" => Some(UploadCategory::Images),
            "files" => Some(UploadCategory::Files),
            "products" => Some(UploadCategory::Products),
            _ => None,
        }
    }

    /// Check an extension (lowercase, with leading dot) against this category's rules
    pub fn check_extension(&self, ext: &str) -> Result<(), UploadError> {
        match self {
            UploadCategory::Images | UploadCategory::Products => {
                if IMAGE_EXTENSIONS.contains(&ext) {
                    Ok(())
                } else {
                    Err(UploadError::UnsupportedType(ext.trim_start_matches('.').to_string()))
                }
            }
            UploadCategory::Files => {
                if BLOCKED_EXTENSIONS.contains(&ext) {
                    Err(UploadError::NotAllowed(ext.trim_start_matches('.').to_string()))
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file size exceeds maximum allowed size of {0} bytes")]
    TooLarge(u64),

    #[error("unsupported file type: {0}. Allowed types: jpg, jpeg, png, gif, webp, svg")]
    UnsupportedType(String),

    #[error("file type not allowed: {0}")]
    NotAllowed(String),

    #[error("missing file name")]
    MissingFileName,

    #[error("failed to read upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Whether the failure was caused by the client rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadError::Io(_))
    }
}

/// Lowercased extension including the leading dot, or an empty string
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Stored names are flat; anything that could walk out of the category directory is refused.
pub fn is_safe_file_name(file_name: &str) -> bool {
    !file_name.is_empty() && !file_name.contains('/') && !file_name.contains('\\') && !file_name.contains("..")
}

pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name).first_or_octet_stream().essence_str().to_string()
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_file_size: u64,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            root: root.into(),
            max_file_size,
        }
    }

    pub fn path_for(&self, category: UploadCategory, file_name: &str) -> PathBuf {
        self.root.join(category.as_str()).join(file_name)
    }

    /// Stream one multipart field to disk after validating its name.
    #[instrument(skip_all, fields(category = category.as_str()))]
    pub async fn store_field(&self, mut field: Field<'_>, category: UploadCategory) -> Result<UploadResponse, UploadError> {
        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
            .ok_or(UploadError::MissingFileName)?;
        let ext = extension_of(&original_name);
        category.check_extension(&ext)?;

        let dir = self.root.join(category.as_str());
        fs::create_dir_all(&dir).await?;

        let file_name = format!("{}{}", Uuid::new_v4(), ext);
        let path = dir.join(&file_name);
        let mut file = fs::File::create(&path).await?;
        let mut hasher = Sha256::new();
        let mut size: u64 = 0;

        let written: Result<(), UploadError> = async {
            while let Some(chunk) = field.chunk().await? {
                size += chunk.len() as u64;
                if size > self.max_file_size {
                    return Err(UploadError::TooLarge(self.max_file_size));
                }
                hasher.update(&chunk);
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(remove_err) = fs::remove_file(&path).await {
                debug!("Could not remove partial upload {}: {}", path.display(), remove_err);
            }
            return Err(e);
        }

        debug!("Stored {} ({} bytes) as {}", original_name, size, file_name);

        Ok(UploadResponse {
            url: format!("/uploads/{}/{}", category.as_str(), file_name),
            mime_type: content_type_for(&file_name),
            hash: hex::encode(hasher.finalize()),
            original_name,
            file_name,
            size,
            uploaded_at: Utc::now(),
        })
    }

    /// Remove a stored file, ignoring files that are already gone
    pub async fn remove(&self, category: UploadCategory, file_name: &str) -> std::io::Result<()> {
        match fs::remove_file(self.path_for(category, file_name)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Read a stored file; `None` when the name is unsafe or nothing is stored under it
    pub async fn read(&self, category: UploadCategory, file_name: &str) -> std::io::Result<Option<Vec<u8>>> {
        if !is_safe_file_name(file_name) {
            return Ok(None);
        }
        match fs::read(self.path_for(category, file_name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
