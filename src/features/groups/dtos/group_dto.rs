use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::groups::models::Group;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupResponseDto {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub teachers_only: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Group> for GroupResponseDto {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            teachers_only: group.teachers_only,
            created_by: group.created_by,
            created_at: group.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupDto {
    #[validate(length(min = 1, max = 128, message = "Group name is required"))]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub teachers_only: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddUsersToGroupDto {
    #[validate(length(min = 1, message = "Group name is required"))]
    pub group_name: String,

    #[validate(length(min = 1, message = "The list of users must not be empty"))]
    pub users_to_add: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GroupsOfUserQuery {
    pub username: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteGroupQuery {
    pub id: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RemoveUserFromGroupQuery {
    pub group_name: String,
    pub user_id: Uuid,
}
