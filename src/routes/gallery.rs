use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::debug;

use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::gallery::ValidationError;
use crate::models::{FileCountResponse, FileListResponse, IncomingFile, MediaItem, UploadMetadata};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_files))
        .route("/files", get(list_files))
        .route("/files/count", get(count_files))
}

/// A body cut off by the request size limit reads as a validation failure;
/// anything else is a malformed request.
fn multipart_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ValidationError::RequestTooLarge.into();
    }
    AppError::BadRequest(format!("{}: {}", context, e.body_text()))
}

/// Splits the multipart body into file parts and the uploader fields.
/// Unknown fields are ignored.
async fn read_upload_form(
    mut multipart: Multipart,
) -> AppResult<(Vec<IncomingFile>, UploadMetadata)> {
    let mut files = Vec::new();
    let mut metadata = UploadMetadata::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart body", e))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        mime_guess::from_path(&file_name)
                            .first_or_octet_stream()
                            .to_string()
                    });
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(&format!("Failed to read {}", file_name), e))?;

                files.push(IncomingFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "name" | "message" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(&format!("Invalid {} field", field_name), e))?;
                if field_name == "name" {
                    metadata.name = value;
                } else {
                    metadata.message = value;
                }
            }
            other => debug!(field = other, "Ignoring unknown upload field"),
        }
    }

    Ok((files, metadata))
}

async fn upload_files(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<Vec<MediaItem>>> {
    let (files, metadata) = read_upload_form(multipart).await?;
    let uploaded = state.gallery.upload(files, metadata).await?;
    Ok(Json(uploaded))
}

async fn list_files(State(state): State<AppState>) -> AppResult<Json<FileListResponse>> {
    let files = state.gallery.list_all().await?;
    Ok(Json(FileListResponse { files }))
}

async fn count_files(State(state): State<AppState>) -> AppResult<Json<FileCountResponse>> {
    let total = state.gallery.total_count().await?;
    Ok(Json(FileCountResponse { total }))
}
