use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::Response,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::core::error::{AppError, Result};
use crate::modules::storage::{LocalStore, StorageKind};

#[derive(Debug, Deserialize, IntoParams)]
pub struct FileQuery {
    pub filename: String,
}

/// Retrieve a post attachment by filename
#[utoipa::path(
    get,
    path = "/api/files",
    params(FileQuery),
    responses(
        (status = 200, description = "File content"),
        (status = 403, description = "Filename escapes the uploads directory"),
        (status = 404, description = "File not found"),
        (status = 401, description = "Authentication required")
    ),
    tag = "files",
    security(("session_token" = []))
)]
pub async fn get_upload(
    State(store): State<Arc<LocalStore>>,
    Query(query): Query<FileQuery>,
) -> Result<Response> {
    serve(&store, StorageKind::Uploads, &query.filename).await
}

/// Retrieve a profile picture by filename
#[utoipa::path(
    get,
    path = "/api/files/profile-picture",
    params(FileQuery),
    responses(
        (status = 200, description = "File content"),
        (status = 403, description = "Filename escapes the profile picture directory"),
        (status = 404, description = "File not found"),
        (status = 401, description = "Authentication required")
    ),
    tag = "files",
    security(("session_token" = []))
)]
pub async fn get_profile_picture(
    State(store): State<Arc<LocalStore>>,
    Query(query): Query<FileQuery>,
) -> Result<Response> {
    serve(&store, StorageKind::ProfilePictures, &query.filename).await
}

async fn serve(store: &LocalStore, kind: StorageKind, filename: &str) -> Result<Response> {
    let path = store.resolve(kind, filename)?;

    let data = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read stored file: {}", e)))?;

    let content_type = mime_guess::from_path(&path).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Failed to build file response: {}", e)))
}
