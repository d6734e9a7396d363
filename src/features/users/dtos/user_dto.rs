use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::users::models::{Role, User};
use crate::modules::storage::FileDescriptor;

/// Public user summary (no credentials)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub profile_picture: Option<FileDescriptor>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponseDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            profile_picture: user.profile_picture.map(|p| p.0),
            created_at: user.created_at,
        }
    }
}

/// Group member summary returned by `/api/users/ofGroup`
#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct GroupMemberDto {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserQuery {
    pub username: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct UsersOfGroupQuery {
    pub group_id: Uuid,
}

/// Multipart form for profile picture upload (Swagger documentation only;
/// the handler uses axum's Multipart extractor directly).
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadProfilePictureDto {
    /// The image file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Profile pictures must be images
pub fn is_profile_picture_allowed(mimetype: &str) -> bool {
    mimetype.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_picture_allows_images_only() {
        assert!(is_profile_picture_allowed("image/png"));
        assert!(is_profile_picture_allowed("image/jpeg"));
        assert!(!is_profile_picture_allowed("application/pdf"));
        assert!(!is_profile_picture_allowed("text/html"));
        assert!(!is_profile_picture_allowed(""));
    }
}
