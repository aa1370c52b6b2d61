//! Multipart uploads and the static route that serves them back.

use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::{
    AppState,
    api::models::{
        envelope::{ApiErrorBody, ApiResponse},
        uploads::{MultiUploadResponse, UploadResponse},
        users::CurrentUser,
    },
    errors::{Error, Result},
    storage::{UploadCategory, UploadError, UploadStore, content_type_for},
};

fn store(state: &AppState) -> UploadStore {
    UploadStore::new(&state.config.uploads.dir, state.config.uploads.max_file_size)
}

fn multipart_error(e: impl std::fmt::Display) -> Error {
    Error::BadRequest {
        message: format!("Failed to parse multipart data: {}", e),
    }
}

impl From<UploadError> for Error {
    fn from(e: UploadError) -> Self {
        if e.is_client_error() {
            Error::BadRequest { message: e.to_string() }
        } else {
            Error::Internal {
                operation: format!("store upload: {e}"),
            }
        }
    }
}

fn not_found(details: &str) -> Result<Response> {
    Ok((
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::failure("Resource not found", "NOT_FOUND", details)),
    )
        .into_response())
}

/// Store the first field named `file` into `category`
async fn upload_single(state: &AppState, mut multipart: Multipart, category: UploadCategory) -> Result<UploadResponse> {
    let store = store(state);
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let upload = store.store_field(field, category).await?;
        info!("Stored upload {} in {}", upload.file_name, category.as_str());
        return Ok(upload);
    }

    Err(Error::BadRequest {
        message: "No file uploaded".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/upload/image",
    tag = "uploads",
    request_body(content_type = "multipart/form-data", description = "Image in the `file` field"),
    responses(
        (status = 201, description = "Image uploaded successfully", body = UploadResponse),
        (status = 400, description = "Missing file, unsupported type or file too large"),
        (status = 401, description = "Authentication required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn upload_image(
    State(state): State<AppState>,
    _: CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadResponse>>)> {
    let upload = upload_single(&state, multipart, UploadCategory::Images).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success("Image uploaded successfully", upload))))
}

#[utoipa::path(
    post,
    path = "/upload/file",
    tag = "uploads",
    request_body(content_type = "multipart/form-data", description = "Document in the `file` field"),
    responses(
        (status = 201, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "Missing file, blocked type or file too large"),
        (status = 401, description = "Authentication required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn upload_file(
    State(state): State<AppState>,
    _: CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadResponse>>)> {
    let upload = upload_single(&state, multipart, UploadCategory::Files).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success("File uploaded successfully", upload))))
}

/// Accepts several `files` fields; each one succeeds or fails on its own.
#[utoipa::path(
    post,
    path = "/upload/multiple",
    tag = "uploads",
    request_body(content_type = "multipart/form-data", description = "Documents in repeated `files` fields"),
    responses(
        (status = 201, description = "Some or all files uploaded", body = MultiUploadResponse),
        (status = 400, description = "No file could be stored, or too many files were sent"),
        (status = 401, description = "Authentication required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn upload_multiple(
    State(state): State<AppState>,
    _: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<MultiUploadResponse>>)> {
    let store = store(&state);
    let max_files = state.config.uploads.max_files_per_request;

    let mut uploaded = Vec::<UploadResponse>::new();
    let mut errors = Vec::new();
    let mut received = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("files") {
            continue;
        }
        received += 1;
        if received > max_files {
            for upload in &uploaded {
                if let Err(e) = store.remove(UploadCategory::Files, &upload.file_name).await {
                    warn!("Failed to remove {} after rejected batch: {}", upload.file_name, e);
                }
            }
            return Err(Error::BadRequest {
                message: format!("too many files, maximum is {max_files}"),
            });
        }

        let original_name = field.file_name().unwrap_or("unnamed").to_string();
        match store.store_field(field, UploadCategory::Files).await {
            Ok(upload) => uploaded.push(upload),
            Err(UploadError::Io(e)) => {
                return Err(Error::Internal {
                    operation: format!("store upload: {e}"),
                });
            }
            Err(e) => errors.push(format!("{original_name}: {e}")),
        }
    }

    if received == 0 {
        return Err(Error::BadRequest {
            message: "No files uploaded".to_string(),
        });
    }

    let message = format!("Uploaded {} of {} files", uploaded.len(), received);
    let response = MultiUploadResponse::new(uploaded, errors);

    if response.count == 0 {
        let details = response.errors.join("; ");
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse {
                success: false,
                message,
                data: Some(response),
                error: Some(ApiErrorBody {
                    code: "VALIDATION_ERROR".to_string(),
                    details,
                }),
            }),
        ));
    }

    info!("{}", message);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(message, response))))
}

/// Serves a stored upload with a content type guessed from its extension
#[utoipa::path(
    get,
    path = "/uploads/{category}/{file_name}",
    tag = "uploads",
    params(
        ("category" = String, Path, description = "images, files or products"),
        ("file_name" = String, Path, description = "Stored file name"),
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "Unknown category or file"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn serve_upload(State(state): State<AppState>, Path((category, file_name)): Path<(String, String)>) -> Result<Response> {
    let Some(category) = UploadCategory::parse(&category) else {
        return not_found("Invalid file category");
    };

    let Some(bytes) = store(&state).read(category, &file_name).await.map_err(|e| Error::Internal {
        operation: format!("read upload: {e}"),
    })?
    else {
        return not_found("File not found");
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&file_name))
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from(bytes))
        .map_err(|e| Error::Internal {
            operation: format!("build upload response: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{bearer, create_test_app, create_test_app_with_config, create_test_config, create_test_user, token_for};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use sqlx::PgPool;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n fake image body";

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_image_and_serve_it(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "uploader").await;

        let form = MultipartForm::new().add_part("file", Part::bytes(PNG_BYTES.to_vec()).file_name("Logo.PNG"));
        let response = server
            .post("/api/v1/upload/image")
            .add_header("authorization", bearer(&token_for(&user, &config)))
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Image uploaded successfully");
        assert_eq!(body["data"]["original_name"], "Logo.PNG");
        assert_eq!(body["data"]["mime_type"], "image/png");
        assert_eq!(body["data"]["size"], PNG_BYTES.len());

        let file_name = body["data"]["file_name"].as_str().unwrap();
        assert!(file_name.ends_with(".png"));
        let url = body["data"]["url"].as_str().unwrap();
        assert_eq!(url, format!("/uploads/images/{file_name}"));
        assert!(config.uploads.dir.join("images").join(file_name).exists());

        let served = server.get(url).await;
        served.assert_status_ok();
        assert_eq!(served.header("content-type"), "image/png");
        assert_eq!(served.as_bytes().as_ref(), PNG_BYTES);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_requires_authentication(pool: PgPool) {
        let (server, _) = create_test_app(pool).await;
        let form = MultipartForm::new().add_part("file", Part::bytes(PNG_BYTES.to_vec()).file_name("logo.png"));
        server.post("/api/v1/upload/image").multipart(form).await.assert_status_unauthorized();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_image_endpoint_rejects_other_types(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "uploader").await;

        let form = MultipartForm::new().add_part("file", Part::bytes(b"%PDF-1.7".to_vec()).file_name("report.pdf"));
        let response = server
            .post("/api/v1/upload/image")
            .add_header("authorization", bearer(&token_for(&user, &config)))
            .multipart(form)
            .await;
        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(
            body["error"]["details"],
            "unsupported file type: pdf. Allowed types: jpg, jpeg, png, gif, webp, svg"
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_oversized_file_is_rejected_and_removed(pool: PgPool) {
        let mut config = create_test_config();
        config.uploads.max_file_size = 16;
        let server = create_test_app_with_config(pool.clone(), config.clone()).await;
        let user = create_test_user(&pool, "uploader").await;

        let form = MultipartForm::new().add_part("file", Part::bytes(vec![b'a'; 64]).file_name("notes.txt"));
        let response = server
            .post("/api/v1/upload/file")
            .add_header("authorization", bearer(&token_for(&user, &config)))
            .multipart(form)
            .await;
        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["details"], "file size exceeds maximum allowed size of 16 bytes");

        let leftovers = std::fs::read_dir(config.uploads.dir.join("files"))
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_multiple_upload_reports_per_file_errors(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "uploader").await;
        let auth = bearer(&token_for(&user, &config));

        let form = MultipartForm::new()
            .add_part("files", Part::bytes(b"a,b\n1,2\n".to_vec()).file_name("data.csv"))
            .add_part("files", Part::bytes(b"echo hi".to_vec()).file_name("run.sh"));
        let response = server
            .post("/api/v1/upload/multiple")
            .add_header("authorization", auth.clone())
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Uploaded 1 of 2 files");
        assert_eq!(body["data"]["count"], 1);
        assert_eq!(body["data"]["error_count"], 1);
        assert_eq!(body["data"]["errors"][0], "run.sh: file type not allowed: sh");

        let form = MultipartForm::new().add_part("files", Part::bytes(b"x".to_vec()).file_name("payload.exe"));
        let response = server
            .post("/api/v1/upload/multiple")
            .add_header("authorization", auth)
            .multipart(form)
            .await;
        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Uploaded 0 of 1 files");
        assert_eq!(body["data"]["error_count"], 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_serving_rejects_unknown_category_and_missing_files(pool: PgPool) {
        let (server, _) = create_test_app(pool).await;
        let response = server.get("/uploads/secrets/a.txt").await;
        response.assert_status_not_found();
        assert_eq!(response.json::<serde_json::Value>()["error"]["details"], "Invalid file category");

        let response = server.get("/uploads/files/missing.txt").await;
        response.assert_status_not_found();
        assert_eq!(response.json::<serde_json::Value>()["error"]["details"], "File not found");

        server.get("/uploads/files/..%2F..%2Fetc%2Fpasswd").await.assert_status_not_found();
    }
}
