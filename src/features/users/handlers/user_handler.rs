use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::auth::models::AuthenticatedUser;
use crate::features::users::dtos::{
    is_profile_picture_allowed, GroupMemberDto, UserQuery, UserResponseDto, UsersOfGroupQuery,
};
use crate::features::users::services::UserService;
use crate::modules::storage::FileDescriptor;
use crate::shared::constants::MAX_TOTAL_UPLOAD_BYTES;
use crate::shared::types::ApiResponse;

/// Look up a user by username
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserQuery),
    responses(
        (status = 200, description = "User found", body = ApiResponse<UserResponseDto>),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("session_token" = []))
)]
pub async fn get_user(
    State(service): State<Arc<UserService>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let user = service.get_by_username(&query.username).await?;
    Ok(Json(ApiResponse::success(Some(user), None, None)))
}

/// List the members of a group
#[utoipa::path(
    get,
    path = "/api/users/ofGroup",
    params(UsersOfGroupQuery),
    responses(
        (status = 200, description = "Members of the group", body = ApiResponse<Vec<GroupMemberDto>>),
        (status = 404, description = "Group not found")
    ),
    tag = "users",
    security(("session_token" = []))
)]
pub async fn users_of_group(
    State(service): State<Arc<UserService>>,
    Query(query): Query<UsersOfGroupQuery>,
) -> Result<Json<ApiResponse<Vec<GroupMemberDto>>>> {
    let members = service.users_of_group(query.group_id).await?;
    Ok(Json(ApiResponse::success(Some(members), None, None)))
}

/// Upload a profile picture for the authenticated user
///
/// Accepts multipart/form-data with a single `file` field; only images are
/// allowed.
#[utoipa::path(
    post,
    path = "/api/users/upload-profile-picture",
    request_body(
        content = crate::features::users::dtos::UploadProfilePictureDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Profile picture uploaded", body = ApiResponse<FileDescriptor>),
        (status = 400, description = "Disallowed file type or oversized upload"),
        (status = 401, description = "Authentication required")
    ),
    tag = "users",
    security(("session_token" = []))
)]
pub async fn upload_profile_picture(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<FileDescriptor>>> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        let mimetype = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?;

        upload = Some((filename, mimetype, data.to_vec()));
    }

    let (filename, mimetype, data) =
        upload.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    if !is_profile_picture_allowed(&mimetype) {
        return Err(AppError::BadRequest(
            "File type is not allowed, profile pictures must be images".to_string(),
        ));
    }

    if data.len() > MAX_TOTAL_UPLOAD_BYTES {
        return Err(AppError::BadRequest(format!(
            "The attached file exceeds the allowed {} MB",
            MAX_TOTAL_UPLOAD_BYTES / 1024 / 1024
        )));
    }

    let descriptor = service
        .upload_profile_picture(&user, &filename, &mimetype, &data)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(descriptor),
        Some("Profile picture uploaded".to_string()),
        None,
    )))
}

/// Remove the authenticated user's profile picture
#[utoipa::path(
    delete,
    path = "/api/users/remove-profile-picture",
    responses(
        (status = 200, description = "Profile picture removed"),
        (status = 401, description = "Authentication required")
    ),
    tag = "users",
    security(("session_token" = []))
)]
pub async fn remove_profile_picture(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<()>>> {
    service.remove_profile_picture(&user).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Profile picture removed".to_string()),
        None,
    )))
}
