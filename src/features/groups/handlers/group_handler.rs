use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::models::AuthenticatedUser;
use crate::features::groups::dtos::{
    AddUsersToGroupDto, CreateGroupDto, DeleteGroupQuery, GroupResponseDto, GroupsOfUserQuery,
    RemoveUserFromGroupQuery,
};
use crate::features::groups::services::GroupService;
use crate::shared::types::ApiResponse;

/// List every group
#[utoipa::path(
    get,
    path = "/api/groups/all",
    responses(
        (status = 200, description = "All groups", body = ApiResponse<Vec<GroupResponseDto>>),
    ),
    tag = "groups",
    security(("session_token" = []))
)]
pub async fn list_groups(
    State(service): State<Arc<GroupService>>,
) -> Result<Json<ApiResponse<Vec<GroupResponseDto>>>> {
    let groups = service.list_all().await?;
    Ok(Json(ApiResponse::success(Some(groups), None, None)))
}

/// List the groups a user belongs to
#[utoipa::path(
    get,
    path = "/api/groups/ofUser",
    params(GroupsOfUserQuery),
    responses(
        (status = 200, description = "Groups of the user", body = ApiResponse<Vec<GroupResponseDto>>),
        (status = 404, description = "User not found")
    ),
    tag = "groups",
    security(("session_token" = []))
)]
pub async fn groups_of_user(
    State(service): State<Arc<GroupService>>,
    Query(query): Query<GroupsOfUserQuery>,
) -> Result<Json<ApiResponse<Vec<GroupResponseDto>>>> {
    let groups = service.groups_of_user(&query.username).await?;
    Ok(Json(ApiResponse::success(Some(groups), None, None)))
}

/// Create a group
#[utoipa::path(
    post,
    path = "/api/groups/create",
    request_body = CreateGroupDto,
    responses(
        (status = 201, description = "Group created", body = ApiResponse<GroupResponseDto>),
        (status = 400, description = "Missing group name"),
        (status = 403, description = "Teachers-only group requested by a student"),
        (status = 409, description = "Group name already taken")
    ),
    tag = "groups",
    security(("session_token" = []))
)]
pub async fn create_group(
    user: AuthenticatedUser,
    State(service): State<Arc<GroupService>>,
    AppJson(dto): AppJson<CreateGroupDto>,
) -> Result<(StatusCode, Json<ApiResponse<GroupResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let group = service.create(&user, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(group),
            Some("Group created".to_string()),
            None,
        )),
    ))
}

/// Delete a group (idempotent)
#[utoipa::path(
    delete,
    path = "/api/groups",
    params(DeleteGroupQuery),
    responses(
        (status = 200, description = "Group deleted (or did not exist)"),
    ),
    tag = "groups",
    security(("session_token" = []))
)]
pub async fn delete_group(
    State(service): State<Arc<GroupService>>,
    Query(query): Query<DeleteGroupQuery>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(query.id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Group deleted".to_string()),
        None,
    )))
}

/// Add users to a group by username
#[utoipa::path(
    post,
    path = "/api/groups/users-to-group",
    request_body = AddUsersToGroupDto,
    responses(
        (status = 200, description = "Users added to the group"),
        (status = 403, description = "Teachers-only membership violation"),
        (status = 404, description = "Group or user not found")
    ),
    tag = "groups",
    security(("session_token" = []))
)]
pub async fn add_users_to_group(
    State(service): State<Arc<GroupService>>,
    AppJson(dto): AppJson<AddUsersToGroupDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.add_users(dto).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Users added to the group".to_string()),
        None,
    )))
}

/// Remove a user from a group (idempotent)
#[utoipa::path(
    delete,
    path = "/api/groups/users-from-group",
    params(RemoveUserFromGroupQuery),
    responses(
        (status = 204, description = "User removed from the group (or was not a member)"),
        (status = 404, description = "Group not found")
    ),
    tag = "groups",
    security(("session_token" = []))
)]
pub async fn remove_user_from_group(
    State(service): State<Arc<GroupService>>,
    Query(query): Query<RemoveUserFromGroupQuery>,
) -> Result<StatusCode> {
    service.remove_user(&query.group_name, query.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
