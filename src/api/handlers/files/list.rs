use crate::api::error::AppError;
use crate::utils::urls::{base_url, public_url};
use crate::utils::validation::is_plain_file_name;
use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};

use super::types::*;

#[utoipa::path(
    get,
    path = "/api/imagenes",
    responses(
        (status = 200, description = "Stored files with an accepted extension, directory order", body = Vec<FileEntry>),
        (status = 500, description = "Storage directory could not be read", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<FileEntry>>, AppError> {
    let accepted = state.config.accepted_types();
    let names = state
        .storage
        .list_directory()
        .await
        .map_err(AppError::DirectoryReadFailure)?;

    let base = base_url(state.config.public_base_url.as_deref(), &headers);
    let entries = names
        .into_iter()
        .filter(|name| accepted.accepts_listed_name(name))
        .map(|name| FileEntry {
            url: public_url(&base, &name),
            nombre: name,
        })
        .collect();

    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/api/imagenes/{nombre}",
    params(
        ("nombre" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileDetailResponse),
        (status = 404, description = "File does not exist", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn get_file_detail(
    State(state): State<crate::AppState>,
    Path(nombre): Path<String>,
    headers: HeaderMap,
) -> Result<Json<FileDetailResponse>, AppError> {
    let not_found = || {
        AppError::FileNotFound(not_found_message(state.config.enable_pdf).to_string())
    };

    if !is_plain_file_name(&nombre) {
        return Err(not_found());
    }
    if !state.storage.file_exists(&nombre).await {
        return Err(not_found());
    }

    let base = base_url(state.config.public_base_url.as_deref(), &headers);
    Ok(Json(FileDetailResponse {
        url: public_url(&base, &nombre),
        path_local: state.storage.absolute_path(&nombre).display().to_string(),
        nombre,
    }))
}
