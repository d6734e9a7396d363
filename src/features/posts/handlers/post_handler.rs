use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::models::AuthenticatedUser;
use crate::features::posts::dtos::{
    is_attachment_allowed, DeletePostQuery, FeedQuery, NewAttachment, NewPostInput, PostFeedDto,
};
use crate::features::posts::models::Visibility;
use crate::features::posts::services::PostService;
use crate::shared::constants::MAX_TOTAL_UPLOAD_BYTES;
use crate::shared::types::ApiResponse;

/// The resolved, authorized feed for a user
#[utoipa::path(
    get,
    path = "/api/posts",
    params(FeedQuery),
    responses(
        (status = 200, description = "Visible posts, newest first", body = ApiResponse<Vec<PostFeedDto>>),
        (status = 404, description = "User not found"),
        (status = 401, description = "Authentication required")
    ),
    tag = "posts",
    security(("session_token" = []))
)]
pub async fn get_posts(
    State(service): State<Arc<PostService>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<ApiResponse<Vec<PostFeedDto>>>> {
    let posts = service.feed(&query.username).await?;
    Ok(Json(ApiResponse::success(Some(posts), None, None)))
}

/// Create a post with optional attachments
///
/// Accepts multipart/form-data: `title`, `content`, `visibility`
/// (PUBLIC/PRIVATE), `labels`, `videoLink`, `teachersOnly`, `groupIds`
/// (comma-separated) and any number of file fields. Attachments are limited
/// to images and office documents, 100 MB in total.
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body(
        content = crate::features::posts::dtos::CreatePostDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Post created", body = ApiResponse<PostFeedDto>),
        (status = 400, description = "Missing fields, disallowed file type or oversized upload"),
        (status = 403, description = "Teachers-only post requested by a student"),
        (status = 401, description = "Authentication required")
    ),
    tag = "posts",
    security(("session_token" = []))
)]
pub async fn create_post(
    user: AuthenticatedUser,
    State(service): State<Arc<PostService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<PostFeedDto>>)> {
    let input = parse_new_post(multipart).await?;

    let post = service.create(&user, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(post),
            Some("Post created".to_string()),
            None,
        )),
    ))
}

/// Delete a post (author or admin; idempotent)
#[utoipa::path(
    delete,
    path = "/api/posts",
    params(DeletePostQuery),
    responses(
        (status = 200, description = "Post deleted (or did not exist)"),
        (status = 403, description = "Not the author or an admin"),
        (status = 401, description = "Authentication required")
    ),
    tag = "posts",
    security(("session_token" = []))
)]
pub async fn delete_post(
    user: AuthenticatedUser,
    State(service): State<Arc<PostService>>,
    Query(query): Query<DeletePostQuery>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&user, query.id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Post deleted".to_string()),
        None,
    )))
}

/// Pull the post fields and attachments out of the multipart request and
/// validate them before anything touches the disk.
async fn parse_new_post(mut multipart: Multipart) -> Result<NewPostInput> {
    let mut title = None;
    let mut content = None;
    let mut visibility = Visibility::Public;
    let mut labels = None;
    let mut video_link = None;
    let mut teachers_only = false;
    let mut group_ids: Vec<Uuid> = Vec::new();
    let mut attachments: Vec<NewAttachment> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        if let Some(filename) = field.file_name().map(|s| s.to_string()) {
            let mimetype = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?;

            attachments.push(NewAttachment {
                filename,
                mimetype,
                data: data.to_vec(),
            });
            continue;
        }

        let name = field.name().unwrap_or("").to_string();
        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read field '{}': {}", name, e)))?;

        match name.as_str() {
            "title" => title = Some(text),
            "content" => content = Some(text),
            "visibility" => {
                visibility = match text.to_uppercase().as_str() {
                    "PRIVATE" => Visibility::Private,
                    _ => Visibility::Public,
                }
            }
            "labels" => {
                if !text.is_empty() {
                    labels = Some(text);
                }
            }
            "videoLink" => {
                if !text.is_empty() {
                    video_link = Some(text);
                }
            }
            "teachersOnly" => teachers_only = matches!(text.as_str(), "true" | "1"),
            "groupIds" => {
                for part in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    let id = part.parse::<Uuid>().map_err(|_| {
                        AppError::BadRequest(format!("Invalid group id: {}", part))
                    })?;
                    group_ids.push(id);
                }
            }
            _ => debug!("Ignoring unknown field: {}", name),
        }
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("The post title is required".to_string()))?;
    let content = content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("The post content is required".to_string()))?;

    for attachment in &attachments {
        if !is_attachment_allowed(&attachment.mimetype, &attachment.filename) {
            return Err(AppError::BadRequest(format!(
                "File type of '{}' is not allowed",
                attachment.filename
            )));
        }
    }

    let total_size: usize = attachments.iter().map(|a| a.data.len()).sum();
    if total_size > MAX_TOTAL_UPLOAD_BYTES {
        return Err(AppError::BadRequest(format!(
            "The attached files exceed the allowed {} MB in total",
            MAX_TOTAL_UPLOAD_BYTES / 1024 / 1024
        )));
    }

    Ok(NewPostInput {
        title,
        content,
        visibility,
        labels,
        video_link,
        teachers_only,
        group_ids,
        attachments,
    })
}
