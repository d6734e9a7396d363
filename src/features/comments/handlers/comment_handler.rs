use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::models::AuthenticatedUser;
use crate::features::comments::dtos::{CommentResponseDto, CreateCommentDto};
use crate::features::comments::services::CommentService;
use crate::shared::types::ApiResponse;

/// List every comment
#[utoipa::path(
    get,
    path = "/api/comments",
    responses(
        (status = 200, description = "All comments", body = ApiResponse<Vec<CommentResponseDto>>),
    ),
    tag = "comments",
    security(("session_token" = []))
)]
pub async fn list_comments(
    State(service): State<Arc<CommentService>>,
) -> Result<Json<ApiResponse<Vec<CommentResponseDto>>>> {
    let comments = service.list().await?;
    Ok(Json(ApiResponse::success(Some(comments), None, None)))
}

/// Comment on a post
#[utoipa::path(
    post,
    path = "/api/comments",
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment created", body = ApiResponse<CommentResponseDto>),
        (status = 404, description = "Post not found")
    ),
    tag = "comments",
    security(("session_token" = []))
)]
pub async fn create_comment(
    user: AuthenticatedUser,
    State(service): State<Arc<CommentService>>,
    AppJson(dto): AppJson<CreateCommentDto>,
) -> Result<(StatusCode, Json<ApiResponse<CommentResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let comment = service.create(&user, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(comment),
            Some("Comment added to the post".to_string()),
            None,
        )),
    ))
}

/// Delete a comment (time-boxed for non-admin authors)
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(
        ("id" = Uuid, Path, description = "Comment id")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Not the author, or the delete window has expired"),
        (status = 404, description = "Comment not found")
    ),
    tag = "comments",
    security(("session_token" = []))
)]
pub async fn delete_comment(
    user: AuthenticatedUser,
    State(service): State<Arc<CommentService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
