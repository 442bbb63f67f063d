use crate::api::error::AppError;
use crate::models::{StoredFile, UploadedFile};
use crate::services::naming;
use crate::services::storage::StagedUpload;
use crate::utils::urls::{base_url, public_url};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode},
};
use futures::TryStreamExt;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

use super::types::*;

fn map_multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// The file stream reaches storage as an `io::Error` wrapping the multipart error.
fn is_body_limit_error(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .and_then(|inner| inner.downcast_ref::<MultipartError>())
            .is_some_and(|m| m.status() == StatusCode::PAYLOAD_TOO_LARGE)
    })
}

fn map_staging_error(e: anyhow::Error) -> AppError {
    if is_body_limit_error(&e) {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::Internal(format!("Failed to store upload: {:#}", e))
    }
}

#[utoipa::path(
    post,
    path = "/api/subir",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "No file provided", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "File type not allowed", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let accepted = state.config.accepted_types();
    let mut custom_name: Option<String> = None;
    let mut staged: Option<(UploadedFile, StagedUpload)> = None;

    // Capture errors so a staged file can be cleaned up before returning
    let result: Result<(), AppError> = async {
        while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == NAME_FIELD {
                custom_name = Some(field.text().await.map_err(map_multipart_error)?);
            } else if name == FILE_FIELD {
                let Some(original_filename) = field.file_name().map(str::to_string) else {
                    debug!("Ignoring '{}' part without a filename", FILE_FIELD);
                    continue;
                };
                if staged.is_some() {
                    return Err(AppError::BadRequest(format!(
                        "Unexpected field: {}",
                        FILE_FIELD
                    )));
                }
                let content_type = field.content_type().map(str::to_string);

                // Reject before anything touches the disk
                if let Err(e) = accepted.check_upload(&original_filename, content_type.as_deref())
                {
                    warn!("Rejected upload '{}': {}", original_filename, e);
                    return Err(AppError::UnsupportedFileType(
                        accepted.rejection_message().to_string(),
                    ));
                }

                // One byte past the cap is enough to tell an oversized file apart
                let limit = state.config.max_file_size as u64;
                let reader =
                    StreamReader::new(field.map_err(std::io::Error::other)).take(limit + 1);
                let upload = state
                    .storage
                    .stage_upload(Box::new(reader))
                    .await
                    .map_err(map_staging_error)?;
                if upload.size > limit {
                    state.storage.discard(upload).await;
                    return Err(AppError::PayloadTooLarge(format!(
                        "File exceeds the maximum size of {} bytes",
                        limit
                    )));
                }

                staged = Some((
                    UploadedFile {
                        original_filename,
                        content_type,
                    },
                    upload,
                ));
            } else {
                debug!("Ignoring multipart field '{}'", name);
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = result {
        if let Some((_, upload)) = staged.take() {
            state.storage.discard(upload).await;
        }
        // Drain the rest of the body so the client sees the JSON error
        // instead of a connection reset.
        warn!("Upload failed early: {}. Consuming remaining stream...", e);
        while let Ok(Some(mut field)) = multipart.next_field().await {
            while let Ok(Some(_)) = field.chunk().await {}
        }
        return Err(e);
    }

    let (file, upload) = staged.ok_or(AppError::NoFileProvided)?;
    let resolved = naming::resolve(custom_name.as_deref(), &file.original_filename);
    let size = upload.size;

    let absolute_path = state.storage.commit(upload, &resolved.filename).await?;

    let stored = StoredFile {
        stored_filename: resolved.filename,
        absolute_path,
        source_kind: resolved.source_kind,
        size,
    };

    info!(
        "💾 Stored '{}' as '{}' ({:?}, {} bytes, {})",
        file.original_filename,
        stored.stored_filename,
        stored.source_kind,
        stored.size,
        file.content_type.as_deref().unwrap_or("unknown type"),
    );
    debug!("Upload written to {}", stored.absolute_path.display());

    let base = base_url(state.config.public_base_url.as_deref(), &headers);
    Ok(Json(UploadResponse {
        mensaje: saved_message(accepted.allows_pdf()).to_string(),
        url: public_url(&base, &stored.stored_filename),
        archivo: stored.stored_filename.clone(),
        nombre_usado: stored.stored_filename,
    }))
}
